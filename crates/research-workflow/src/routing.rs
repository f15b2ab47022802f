//! Intent routing on the edges leaving the intent agent

use std::sync::Arc;

use agent_core::{EdgeCondition, WorkflowEvent, decode_structured};

use crate::model::{Intent, IntentResult};

/// Where an intent agent reply should go
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Chat,
    Research,
    /// Not an agent reply, or a reply that is not a valid intent record
    Unroutable,
}

impl From<Intent> for Route {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Chat => Route::Chat,
            Intent::Research => Route::Research,
        }
    }
}

/// Classify an event by the intent it carries
pub fn route(event: &WorkflowEvent) -> Route {
    let WorkflowEvent::Response(response) = event else {
        return Route::Unroutable;
    };

    match decode_structured::<IntentResult>(&response.text) {
        Ok(result) => result.intent.into(),
        Err(e) => {
            tracing::debug!(executor = %response.executor_id, error = %e, "Reply is not an intent record");
            Route::Unroutable
        }
    }
}

/// Edge predicate that passes intent replies matching `expected`
///
/// Events other than agent replies always pass. Replies that do not decode
/// as an intent record never pass.
pub fn intent_condition(expected: Intent) -> EdgeCondition {
    let expected = Route::from(expected);
    Arc::new(move |event| match event {
        WorkflowEvent::Response(_) => route(event) == expected,
        _ => true,
    })
}
