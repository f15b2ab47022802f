//! Bridge steps
//!
//! Each bridge turns one agent's structured reply into the next agent's
//! request. A reply that does not decode is an error for the whole run.

use agent_core::{AgentError, AgentRequest, Result, WorkflowEvent, decode_structured};

use crate::model::{IntentResult, ResearchTopics};
use crate::prompts::{format_topics, report_prompt};

fn reply_text<'a>(bridge: &str, event: &'a WorkflowEvent) -> Result<&'a str> {
    match event {
        WorkflowEvent::Response(response) => Ok(&response.text),
        other => Err(AgentError::Workflow(format!(
            "{} expects an agent reply, got a {}",
            bridge,
            other.kind()
        ))),
    }
}

/// Forward the intent agent's copy of the user message to the chat agent
pub fn to_chat(event: &WorkflowEvent) -> Result<WorkflowEvent> {
    let intent: IntentResult = decode_structured(reply_text("to_chat", event)?)?;
    Ok(WorkflowEvent::Request(AgentRequest::user(intent.user_message)))
}

/// Forward the intent agent's copy of the user message to the plan agent
pub fn to_plan(event: &WorkflowEvent) -> Result<WorkflowEvent> {
    let intent: IntentResult = decode_structured(reply_text("to_plan", event)?)?;
    Ok(WorkflowEvent::Request(AgentRequest::user(intent.user_message)))
}

/// Turn a research plan into the report agent's prompt
pub fn to_report(event: &WorkflowEvent) -> Result<WorkflowEvent> {
    let plan: ResearchTopics = decode_structured(reply_text("to_report", event)?)?;
    tracing::info!(topics = plan.topics.len(), "Research plan ready");

    let prompt = report_prompt(&format_topics(&plan), &plan.user_message);
    Ok(WorkflowEvent::Request(AgentRequest::user(prompt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentResponse;

    fn reply(text: &str) -> WorkflowEvent {
        WorkflowEvent::Response(AgentResponse {
            executor_id: "upstream".into(),
            text: text.into(),
            messages: vec![],
        })
    }

    fn request_text(event: WorkflowEvent) -> String {
        match event {
            WorkflowEvent::Request(request) => {
                assert!(request.should_respond);
                request.messages[0].content.clone()
            }
            other => panic!("expected a request, got {}", other.kind()),
        }
    }

    #[test]
    fn test_to_chat_forwards_user_message() {
        let next = to_chat(&reply(r#"{"intent":"chat","user_message":"tell me a joke"}"#)).unwrap();
        assert_eq!(request_text(next), "tell me a joke");
    }

    #[test]
    fn test_to_report_builds_prompt() {
        let plan = r#"{"topics":[{"topic":"Deliveries for Tesla","steps":["Find Q3 deliveries for Tesla"]}],"user_message":"How did Tesla do in Q3?"}"#;
        let text = request_text(to_report(&reply(plan)).unwrap());

        assert_eq!(
            text,
            "<research_topics>\nTopics and steps: Deliveries for Tesla\n- Find Q3 deliveries for Tesla\n</research_topics>\n\n<request>\nHow did Tesla do in Q3?\n</request>\n"
        );
    }

    #[test]
    fn test_decode_failure_is_parse_error() {
        assert!(matches!(to_plan(&reply("I think this is research")), Err(AgentError::Parse(_))));
        assert!(matches!(to_report(&reply("{\"topics\": 3}")), Err(AgentError::Parse(_))));
    }

    #[test]
    fn test_requires_agent_reply() {
        let err = to_chat(&WorkflowEvent::Output("x".into())).unwrap_err();
        assert!(matches!(err, AgentError::Workflow(_)));
    }
}
