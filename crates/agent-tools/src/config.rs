//! Upstream Data Source Configuration

use std::env;

use serde::{Deserialize, Serialize};

use crate::search::{self, UserLocation};
use crate::{market, weather};

/// Where the tools fetch their data from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub weather_base_url: String,
    pub market_data_base_url: String,
    pub web_search_base_url: String,

    /// Location the web search is localised to
    pub search_location: UserLocation,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_base_url: weather::DEFAULT_BASE_URL.into(),
            market_data_base_url: market::DEFAULT_BASE_URL.into(),
            web_search_base_url: search::DEFAULT_BASE_URL.into(),
            search_location: UserLocation::default(),
        }
    }
}

impl ToolsConfig {
    /// Read `WEATHER_BASE_URL`, `MARKET_DATA_BASE_URL`, `WEB_SEARCH_BASE_URL`,
    /// `WEB_SEARCH_CITY` and `WEB_SEARCH_COUNTRY`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            weather_base_url: get("WEATHER_BASE_URL", defaults.weather_base_url),
            market_data_base_url: get("MARKET_DATA_BASE_URL", defaults.market_data_base_url),
            web_search_base_url: get("WEB_SEARCH_BASE_URL", defaults.web_search_base_url),
            search_location: UserLocation {
                city: get("WEB_SEARCH_CITY", defaults.search_location.city),
                country: get("WEB_SEARCH_COUNTRY", defaults.search_location.country),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ToolsConfig::from_lookup(|_| None);
        assert_eq!(config, ToolsConfig::default());
        assert_eq!(config.weather_base_url, "http://wttr.in");
        assert_eq!(config.search_location.city, "Seoul");
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let vars: HashMap<&str, &str> = [("WEB_SEARCH_COUNTRY", "US"), ("WEATHER_BASE_URL", "  ")].into();
        let config = ToolsConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.search_location.country, "US");
        assert_eq!(config.search_location.city, "Seoul");
        assert_eq!(config.weather_base_url, "http://wttr.in");
    }
}
