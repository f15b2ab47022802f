//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;

use crate::entities::EntityCatalog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Chat-completion provider shared by every entity
    pub provider: Arc<dyn LlmProvider>,

    /// Whether endpoint and credentials were supplied at startup
    pub provider_configured: bool,

    /// Agents and workflows served by this instance
    pub entities: Arc<EntityCatalog>,
}
