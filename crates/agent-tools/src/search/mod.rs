//! Web Search Integration
//!
//! Search results for the research and search agents. The production client
//! uses the DuckDuckGo Instant Answer API, biased by a coarse user location.

mod duckduckgo;
mod mock;

pub use duckduckgo::{DEFAULT_BASE_URL, DuckDuckGoClient};
pub use mock::MockSearchClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Approximate location used to localise results
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    pub city: String,

    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl Default for UserLocation {
    fn default() -> Self {
        Self {
            city: "Seoul".into(),
            country: "KR".into(),
        }
    }
}

impl UserLocation {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    /// DuckDuckGo region code (`kl`) for the country, `wt-wt` when unknown
    pub fn region(&self) -> &'static str {
        match self.country.trim().to_uppercase().as_str() {
            "KR" => "kr-kr",
            "US" => "us-en",
            "GB" | "UK" => "uk-en",
            "JP" => "jp-jp",
            "CN" => "cn-zh",
            "DE" => "de-de",
            "FR" => "fr-fr",
            "CA" => "ca-en",
            "AU" => "au-en",
            "IN" => "in-en",
            _ => "wt-wt",
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Up to `limit` results for `query`, best first
    async fn search(&self, query: &str, location: &UserLocation, limit: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}
