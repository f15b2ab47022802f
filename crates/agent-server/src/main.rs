//! Agent Dev Server
//!
//! Axum-based local server exposing the finance, weather and search agents
//! and the research workflow over REST and WebSocket.

mod entities;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::OpenAiProvider;
use agent_tools::{Toolbox, ToolsConfig};

use crate::entities::build_catalog;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before tracing reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize LLM provider
    let provider = OpenAiProvider::from_env()?;
    let provider_configured = provider.config().is_configured();
    let model = provider.config().model.clone();
    let provider: Arc<dyn LlmProvider> = Arc::new(provider);

    if provider_configured {
        match provider.health_check().await {
            Ok(true) => tracing::info!("✓ Connected to chat-completion endpoint (model: {})", model),
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ Chat-completion endpoint not reachable - agents will fail");
            }
        }
    } else {
        tracing::warn!("⚠ Provider not configured - agents will fail");
        tracing::warn!("  Set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY, or OPENAI_BASE_URL, in .env");
    }

    // Initialize tools
    let tools_config = ToolsConfig::from_env();
    let toolbox = Toolbox::from_config(&tools_config)?;
    tracing::info!(
        "Web search localised to {}, {}",
        tools_config.search_location.city,
        tools_config.search_location.country
    );

    let today = chrono::Local::now().date_naive();
    let entities = build_catalog(provider.clone(), &toolbox, &model, today)?;

    // Build application state
    let state = AppState {
        provider,
        provider_configured,
        entities: Arc::new(entities),
    };

    let app = routes::router(state.clone());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 agent dev server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Entities:");
    for id in state.entities.ids() {
        tracing::info!("  • {}", id);
    }
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /v1/entities            - List agents and workflows");
    tracing::info!("  POST /v1/entities/{{id}}/run    - Run an entity on one message");
    tracing::info!("  GET  /v1/entities/{{id}}/stream - WebSocket streaming");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
