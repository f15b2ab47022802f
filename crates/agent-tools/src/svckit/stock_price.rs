//! Stock and Currency Price Tools
//!
//! Three tools over one `MarketDataClient`: a daily price range as CSV, the
//! current stock price and the current exchange rate of a currency pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use super::into_result;
use crate::error::{Result, ToolError};
use crate::market::{MarketDataClient, currency_symbol};

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ToolError::InvalidDate(value.to_string()))
}

fn market_schema(name: &str, description: &str, parameters: Vec<ParameterSchema>) -> ToolSchema {
    ToolSchema {
        name: name.into(),
        description: description.into(),
        parameters,
        category: Some("market_data".into()),
        has_side_effects: false,
    }
}

/// Daily open/close prices for a ticker between two dates
pub struct StockPriceRangeTool {
    market: Arc<dyn MarketDataClient>,
    today: Option<NaiveDate>,
}

impl StockPriceRangeTool {
    pub const NAME: &'static str = "get_stock_price_range";

    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market, today: None }
    }

    /// Pin "today" (the default end date)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn csv(&self, ticker: &str, start_date: &str, end_date: Option<&str>) -> Result<String> {
        let start = parse_date(start_date)?;
        let end = match end_date {
            Some(end) => parse_date(end)?,
            None => self.today(),
        };

        let bars = self.market.daily_bars(ticker.trim(), start, end).await?;

        let mut lines = Vec::with_capacity(bars.len() + 1);
        lines.push("date,open,close".to_string());
        for bar in &bars {
            lines.push(format!("{},{:.6},{:.6}", bar.date.format("%Y-%m-%d"), bar.open, bar.close));
        }
        Ok(lines.join("\n"))
    }

    pub async fn price_range(&self, ticker: &str, start_date: &str, end_date: Option<&str>) -> String {
        tracing::info!(ticker, start_date, end_date, "tool: getting stock price range");

        self.csv(ticker, start_date, end_date)
            .await
            .unwrap_or_else(|e| format!("Error fetching stock data: {}", e))
    }
}

#[async_trait]
impl Tool for StockPriceRangeTool {
    fn schema(&self) -> ToolSchema {
        market_schema(
            Self::NAME,
            "Fetches the stock price data for a given stock ticker within a specified date range. Returns CSV lines of date,open,close.",
            vec![
                ParameterSchema::string("stock_ticker", "The stock ticker symbol to fetch data for."),
                ParameterSchema::string("start_date", "The start date for the data retrieval (YYYY-MM-DD)."),
                ParameterSchema::string(
                    "end_date",
                    "The end date for the data retrieval (YYYY-MM-DD). If omitted, defaults to the current date.",
                )
                .optional(),
            ],
        )
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = call.str_arg("stock_ticker").unwrap_or_default();
        let start = call.str_arg("start_date").unwrap_or_default();
        let end = call.str_arg("end_date").filter(|s| !s.trim().is_empty());

        Ok(into_result(Self::NAME, self.price_range(ticker, start, end).await))
    }
}

#[derive(Serialize)]
struct StockPrice<'a> {
    stock_symbol: &'a str,
    current_price: f64,
}

/// Latest traded price for a ticker
pub struct StockPriceCurrentTool {
    market: Arc<dyn MarketDataClient>,
}

impl StockPriceCurrentTool {
    pub const NAME: &'static str = "get_stock_price_current";

    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }

    async fn json(&self, ticker: &str) -> Result<String> {
        let quote = self.market.quote(ticker.trim()).await?;
        let current_price = quote.price.to_f64().ok_or_else(|| ToolError::InvalidResponse(quote.price.to_string()))?;

        Ok(serde_json::to_string(&StockPrice {
            stock_symbol: ticker,
            current_price,
        })?)
    }

    pub async fn current_price(&self, ticker: &str) -> String {
        tracing::info!(ticker, "tool: getting current stock price");

        self.json(ticker)
            .await
            .unwrap_or_else(|e| format!("Error fetching stock data: {}", e))
    }
}

#[async_trait]
impl Tool for StockPriceCurrentTool {
    fn schema(&self) -> ToolSchema {
        market_schema(
            Self::NAME,
            "Fetches the current stock price data for a given stock ticker.",
            vec![ParameterSchema::string("stock_ticker", "The stock ticker symbol to fetch data for.")],
        )
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = call.str_arg("stock_ticker").unwrap_or_default();
        Ok(into_result(Self::NAME, self.current_price(ticker).await))
    }
}

#[derive(Serialize)]
struct CurrencyRate<'a> {
    currency_pair: &'a str,
    current_rate: f64,
}

/// Current exchange rate for a pair such as `USDKRW`
pub struct CurrencyRateTool {
    market: Arc<dyn MarketDataClient>,
}

impl CurrencyRateTool {
    pub const NAME: &'static str = "get_currency_rate_current";

    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }

    async fn json(&self, pair: &str) -> Result<String> {
        let quote = self.market.quote(&currency_symbol(pair)).await?;

        // Reported as the session open
        let open = quote.open.ok_or(ToolError::MissingField("open"))?;
        let current_rate = open.to_f64().ok_or_else(|| ToolError::InvalidResponse(open.to_string()))?;

        Ok(serde_json::to_string(&CurrencyRate {
            currency_pair: pair,
            current_rate,
        })?)
    }

    pub async fn current_rate(&self, pair: &str) -> String {
        tracing::info!(pair, "tool: getting current currency rate");

        self.json(pair)
            .await
            .unwrap_or_else(|e| format!("Error fetching currency data: {}", e))
    }
}

#[async_trait]
impl Tool for CurrencyRateTool {
    fn schema(&self) -> ToolSchema {
        market_schema(
            Self::NAME,
            "Fetches the current currency exchange rate for a given currency pair.",
            vec![ParameterSchema::string(
                "currency_pair",
                "The currency pair to fetch data for (e.g., \"USDKRW, EURUSD, USDJPY\").",
            )],
        )
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let pair = call.str_arg("currency_pair").unwrap_or_default();
        Ok(into_result(Self::NAME, self.current_rate(pair).await))
    }
}
