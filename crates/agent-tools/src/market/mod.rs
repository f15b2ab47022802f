//! Market Data Integration
//!
//! Stock and currency price sources. Prices are `Decimal`, never `f64`.

mod mock;
mod yahoo;

pub use mock::MockMarketData;
pub use yahoo::{DEFAULT_BASE_URL, YahooFinanceClient};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One trading day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Latest price snapshot for a symbol
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Opening price of the current session
    pub open: Option<Decimal>,

    pub currency: Option<String>,
}

/// Market data source (Strategy pattern)
///
/// Implement this for each provider: Yahoo Finance, Alpha Vantage, ...
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Daily bars for `symbol` from `start` (inclusive) to `end` (exclusive), oldest first
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>>;

    /// Current quote for `symbol`
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Yahoo-style symbol for a currency pair ("USDKRW" -> "USDKRW=X")
pub fn currency_symbol(pair: &str) -> String {
    let pair = pair.trim().to_uppercase();
    if pair.ends_with("=X") {
        pair
    } else {
        format!("{}=X", pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol("usdkrw"), "USDKRW=X");
        assert_eq!(currency_symbol("EURUSD=X"), "EURUSD=X");
    }
}
