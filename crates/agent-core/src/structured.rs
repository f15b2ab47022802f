//! Structured Output
//!
//! Decodes model replies into typed records. Models asked for JSON sometimes
//! wrap it in a markdown fence or a sentence of prose; the decoder accepts
//! that, but anything that does not match the target type is an error the
//! caller has to handle.

use serde::de::DeserializeOwned;

use crate::error::{AgentError, Result};

/// A type the model can be asked to produce as JSON
pub trait StructuredOutput: DeserializeOwned {
    /// Name sent with the JSON schema (letters, digits, `_` and `-` only)
    fn schema_name() -> &'static str;

    /// JSON schema describing the expected object
    fn json_schema() -> serde_json::Value;
}

/// Decode model text into `T`
pub fn decode_structured<T: StructuredOutput>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AgentError::Parse(format!(
            "empty response where {} was expected",
            T::schema_name()
        )));
    }

    let first_err = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match extract_json_object(trimmed) {
        Some(candidate) if candidate != trimmed => serde_json::from_str::<T>(candidate)
            .map_err(|e| AgentError::Parse(format!("{}: {}", T::schema_name(), e))),
        _ => Err(AgentError::Parse(format!("{}: {}", T::schema_name(), first_err))),
    }
}

/// Locate the JSON object inside a fenced block or surrounding prose
fn extract_json_object(text: &str) -> Option<&str> {
    let body = match text.find("```") {
        Some(fence) => {
            let after = &text[fence + 3..];
            // Skip the language tag line (```json)
            let after = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
            after.find("```").map_or(after, |end| &after[..end])
        }
        None => text,
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&body[start..=end])
}
