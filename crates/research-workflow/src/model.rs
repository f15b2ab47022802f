//! Structured records exchanged between the workflow's agents

use serde::{Deserialize, Serialize};
use serde_json::json;

use agent_core::StructuredOutput;

/// What the user wants from the workflow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Casual conversation, answered directly
    Chat,
    /// Needs planning, web search and a report
    Research,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Chat => write!(f, "chat"),
            Intent::Research => write!(f, "research"),
        }
    }
}

/// Intent agent verdict, carrying the original user message along
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub user_message: String,
}

impl StructuredOutput for IntentResult {
    fn schema_name() -> &'static str {
        "IntentResponse"
    }

    fn json_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "intent": { "type": "string", "enum": ["chat", "research"] },
                "user_message": { "type": "string" }
            },
            "required": ["intent", "user_message"],
            "additionalProperties": false
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchTopic {
    pub topic: String,
    pub steps: Vec<String>,
}

/// Research plan produced by the plan agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchTopics {
    pub topics: Vec<ResearchTopic>,
    pub user_message: String,
}

impl StructuredOutput for ResearchTopics {
    fn schema_name() -> &'static str {
        "ResearchTopics"
    }

    fn json_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "topics": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "topic": { "type": "string" },
                            "steps": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["topic", "steps"],
                        "additionalProperties": false
                    }
                },
                "user_message": { "type": "string" }
            },
            "required": ["topics", "user_message"],
            "additionalProperties": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentError, decode_structured};

    #[test]
    fn test_intent_wire_form() {
        let result: IntentResult = decode_structured(r#"{"intent":"research","user_message":"Tesla Q3"}"#).unwrap();
        assert_eq!(result.intent, Intent::Research);
        assert_eq!(serde_json::to_string(&Intent::Chat).unwrap(), "\"chat\"");
    }

    #[test]
    fn test_intent_result_round_trip() {
        let original = IntentResult {
            intent: Intent::Chat,
            user_message: "h\u{e9}llo \"quoted\" \n {braces}".to_string(),
        };

        let wire = serde_json::to_string(&original).unwrap();
        let decoded: IntentResult = decode_structured(&wire).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_unknown_intent_rejected() {
        let err = decode_structured::<IntentResult>(r#"{"intent":"shopping","user_message":"x"}"#).unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_topics_from_fenced_reply() {
        let reply = "```json\n{\"topics\":[{\"topic\":\"Growth for France\",\"steps\":[\"Find GDP growth for France\"]}],\"user_message\":\"France economy\"}\n```";
        let plan: ResearchTopics = decode_structured(reply).unwrap();
        assert_eq!(plan.topics.len(), 1);
        assert_eq!(plan.topics[0].steps[0], "Find GDP growth for France");
    }

    #[test]
    fn test_schemas_are_closed() {
        assert_eq!(IntentResult::json_schema()["additionalProperties"], false);
        assert_eq!(ResearchTopics::json_schema()["properties"]["topics"]["items"]["additionalProperties"], false);
    }
}
