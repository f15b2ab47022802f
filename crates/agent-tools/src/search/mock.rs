//! Mock Search Client

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{SearchClient, SearchHit, UserLocation};
use crate::error::{Result, ToolError};

/// Returns the same hits for every query and records what was asked
#[derive(Default)]
pub struct MockSearchClient {
    hits: Vec<SearchHit>,
    fail_with: Option<u16>,
    queries: Mutex<Vec<String>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, title: &str, url: &str, snippet: &str) -> Self {
        self.hits.push(SearchHit {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        });
        self
    }

    /// Make every search fail with the given HTTP status
    pub fn failing(mut self, status: u16) -> Self {
        self.fail_with = Some(status);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(&self, query: &str, _location: &UserLocation, limit: usize) -> Result<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        if let Some(status) = self.fail_with {
            return Err(ToolError::Status(status));
        }

        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "MockSearch"
    }
}
