//! # agent-tools
//!
//! Tools for the finance, weather and search agents, and the upstream data
//! clients they call:
//!
//! | Tool                        | Upstream            |
//! |-----------------------------|---------------------|
//! | `get_current_weather`       | wttr.in             |
//! | `get_stock_price_range`     | Yahoo Finance chart |
//! | `get_stock_price_current`   | Yahoo Finance chart |
//! | `get_currency_rate_current` | Yahoo Finance chart |
//! | `web_search`                | DuckDuckGo          |
//!
//! Each upstream sits behind a trait with a mock implementation, so agents
//! and workflows can be exercised offline.

pub mod config;
pub mod error;
pub mod market;
pub mod search;
pub mod svckit;
pub mod toolbox;
pub mod weather;

use chrono::NaiveDate;

pub use config::ToolsConfig;
pub use error::{Result, ToolError};
pub use toolbox::Toolbox;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        CurrencyRateTool,
        StockPriceCurrentTool,
        StockPriceRangeTool,
        WeatherTool,
        WebSearchTool,
    };
}

/// System prompt for the finance agent; `{today}` is filled by [`finance_instructions`]
pub const FINANCE_AGENT_PROMPT: &str = r#"You are a helpful assistant that helps the user with the help of some functions.
If you are using multiple tools to solve a user's task, make sure to communicate information learned from one tool to the next tool.
First, make a plan of how you will use the tools to solve the user's task and communicate that plan to the user with the first response.
Then execute the plan making sure to communicate the required information between tools since tools only see the information passed to them;
they do not have access to the chat history.

You will use `get_stock_price_range` to get the stock price data for a given stock ticker within a specified date range.
Use `get_stock_price_current` for the latest price of a stock and `get_currency_rate_current` for exchange rates.
Use `get_current_weather` when the user asks about the weather in a city.

Don't make assumptions about what values to plug into functions. Ask for clarification if a user request is ambiguous.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Today is {today}."#;

/// System prompt for the weather agent
pub const WEATHER_AGENT_PROMPT: &str = r#"You are a helpful weather assistant.
Use `get_current_weather` to look up the current conditions for any city the user mentions.
City names must be passed in English, e.g. 'Seoul' or 'New York'. If the user names several cities, look each one up.
Report temperature in Celsius and mention humidity. If a lookup fails, say so plainly instead of guessing."#;

/// System prompt for the web search agent
pub const SEARCH_AGENT_PROMPT: &str = "You are a helpful assistant with web search capabilities";

/// Finance agent instructions with today's date filled in
pub fn finance_instructions(today: NaiveDate) -> String {
    FINANCE_AGENT_PROMPT.replace("{today}", &today.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_instructions_date() {
        let prompt = finance_instructions(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert!(prompt.ends_with("Today is 2025-03-07."));
        assert!(!prompt.contains("{today}"));
    }
}
