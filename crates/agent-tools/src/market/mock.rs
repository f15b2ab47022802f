//! Mock Market Data
//!
//! For testing and demo purposes. Serves whatever bars and quotes it was seeded with.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{DailyBar, MarketDataClient, Quote};
use crate::error::{Result, ToolError};

/// In-memory market data keyed by upper-case symbol
#[derive(Default)]
pub struct MockMarketData {
    bars: HashMap<String, Vec<DailyBar>>,
    quotes: HashMap<String, Quote>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed daily bars for a symbol
    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.bars.insert(symbol.to_uppercase(), bars);
        self
    }

    /// Seed a quote for a symbol
    pub fn with_quote(mut self, symbol: &str, price: Decimal, open: Option<Decimal>) -> Self {
        let symbol = symbol.to_uppercase();
        self.quotes.insert(
            symbol.clone(),
            Quote {
                symbol,
                price,
                open,
                currency: Some("USD".into()),
            },
        );
        self
    }

    /// Helper for tests: a bar with the given open/close
    pub fn bar(date: &str, open: Decimal, close: Decimal) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or(NaiveDate::MIN),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1_000_000,
        }
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>> {
        let bars = self
            .bars
            .get(&symbol.to_uppercase())
            .ok_or_else(|| ToolError::NoData(symbol.to_string()))?;

        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date < end)
            .cloned()
            .collect())
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        self.quotes
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| ToolError::NoData(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_range_filter_is_end_exclusive() {
        let market = MockMarketData::new().with_bars(
            "tsla",
            vec![
                MockMarketData::bar("2024-05-01", dec!(180), dec!(179)),
                MockMarketData::bar("2024-05-02", dec!(181), dec!(182)),
                MockMarketData::bar("2024-05-03", dec!(183), dec!(184)),
            ],
        );

        let bars = market.daily_bars("TSLA", day("2024-05-01"), day("2024-05-03")).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, dec!(182));
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let market = MockMarketData::new();
        assert!(matches!(market.quote("NOTREAL").await, Err(ToolError::NoData(_))));
    }
}
