//! Toolbox
//!
//! Owns the shared upstream clients and hands out the tool sets each agent
//! is configured with.

use std::sync::Arc;

use agent_core::{Tool, ToolRegistry};

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::market::{MarketDataClient, YahooFinanceClient};
use crate::search::{DuckDuckGoClient, SearchClient, UserLocation};
use crate::svckit::{CurrencyRateTool, StockPriceCurrentTool, StockPriceRangeTool, WeatherTool, WebSearchTool};
use crate::weather::{WeatherClient, WttrClient};

#[derive(Clone)]
pub struct Toolbox {
    weather: Arc<dyn WeatherClient>,
    market: Arc<dyn MarketDataClient>,
    search: Arc<dyn SearchClient>,
    location: UserLocation,
}

impl Toolbox {
    pub fn new(
        weather: Arc<dyn WeatherClient>,
        market: Arc<dyn MarketDataClient>,
        search: Arc<dyn SearchClient>,
        location: UserLocation,
    ) -> Self {
        Self {
            weather,
            market,
            search,
            location,
        }
    }

    /// Live clients (wttr.in, Yahoo Finance, DuckDuckGo)
    pub fn from_config(config: &ToolsConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(WttrClient::new(&config.weather_base_url)?),
            Arc::new(YahooFinanceClient::new(&config.market_data_base_url)?),
            Arc::new(DuckDuckGoClient::new(&config.web_search_base_url)?),
            config.search_location.clone(),
        ))
    }

    pub fn weather_tool(&self) -> WeatherTool {
        WeatherTool::new(self.weather.clone())
    }

    pub fn web_search_tool(&self) -> Arc<dyn Tool> {
        Arc::new(WebSearchTool::new(self.search.clone(), self.location.clone()))
    }

    /// Weather plus the three market data tools
    pub fn finance_tools(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(self.weather_tool());
        registry.register(StockPriceRangeTool::new(self.market.clone()));
        registry.register(StockPriceCurrentTool::new(self.market.clone()));
        registry.register(CurrencyRateTool::new(self.market.clone()));
        registry
    }

    pub fn weather_tools(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(self.weather_tool());
        registry
    }

    pub fn search_tools(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_shared(self.web_search_tool());
        registry
    }
}
