//! Web Search Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use super::into_result;
use crate::search::{SearchClient, UserLocation};

pub const DEFAULT_MAX_RESULTS: usize = 5;

pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
    location: UserLocation,
    max_results: usize,
}

impl WebSearchTool {
    pub const NAME: &'static str = "web_search";

    pub fn new(client: Arc<dyn SearchClient>, location: UserLocation) -> Self {
        Self {
            client,
            location,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn location(&self) -> &UserLocation {
        &self.location
    }

    pub async fn search(&self, query: &str) -> String {
        let query = query.trim();
        tracing::info!(query, region = self.location.region(), "tool: searching the web");

        let hits = match self.client.search(query, &self.location, self.max_results).await {
            Ok(hits) => hits,
            Err(e) => return format!("Error performing web search: {}", e),
        };

        if hits.is_empty() {
            return format!("No results found for \"{}\"", query);
        }

        hits.iter()
            .enumerate()
            .map(|(i, hit)| format!("{}. {} — {}\n   {}", i + 1, hit.title, hit.url, hit.snippet))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: format!(
                "Search the web for up-to-date information. Results are localised to {}, {}.",
                self.location.city, self.location.country
            ),
            parameters: vec![ParameterSchema::string("query", "The search query.")],
            category: Some("search".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default();
        Ok(into_result(Self::NAME, self.search(query).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MockSearchClient;

    #[tokio::test]
    async fn test_numbered_results() {
        let client = Arc::new(
            MockSearchClient::new()
                .with_hit("Seoul weather", "https://example.test/a", "Mild and clear")
                .with_hit("KOSPI today", "https://example.test/b", "Index up 0.4%"),
        );
        let tool = WebSearchTool::new(client.clone(), UserLocation::default());

        let text = tool.search("  seoul news ").await;
        assert_eq!(
            text,
            "1. Seoul weather — https://example.test/a\n   Mild and clear\n2. KOSPI today — https://example.test/b\n   Index up 0.4%"
        );
        assert_eq!(client.queries(), vec!["seoul news".to_string()]);
    }

    #[tokio::test]
    async fn test_no_results() {
        let tool = WebSearchTool::new(Arc::new(MockSearchClient::new()), UserLocation::default());
        let result = tool.execute(&ToolCall::new(WebSearchTool::NAME).arg("query", "zzqx")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "No results found for \"zzqx\"");
    }

    #[tokio::test]
    async fn test_failure() {
        let tool = WebSearchTool::new(Arc::new(MockSearchClient::new().failing(503)), UserLocation::default());
        let result = tool.execute(&ToolCall::new(WebSearchTool::NAME).arg("query", "rust")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Error performing web search: upstream returned HTTP 503");
    }
}
