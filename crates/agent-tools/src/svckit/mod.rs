//! Service Kit - Agent Tools
//!
//! Tools that implement `agent_core::Tool` on top of the upstream data
//! clients. Every tool answers with text, including on failure: upstream
//! problems are rendered as an `Error ...` line the model can read.

mod stock_price;
mod weather_tool;
mod web_search;

pub use stock_price::{CurrencyRateTool, StockPriceCurrentTool, StockPriceRangeTool};
pub use weather_tool::WeatherTool;
pub use web_search::WebSearchTool;

use agent_core::ToolResult;

/// Wrap tool text in a `ToolResult`, failed when the text is an error line
fn into_result(name: &str, text: String) -> ToolResult {
    if text.starts_with("Error") {
        ToolResult::failure(name, text)
    } else {
        ToolResult::success(name, text)
    }
}
