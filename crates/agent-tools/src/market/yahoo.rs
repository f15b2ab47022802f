//! Yahoo Finance Client
//!
//! Reads the public chart endpoint (`/v8/finance/chart/{symbol}`), which
//! serves both daily history and the latest session for stocks and
//! `XXXYYY=X` currency pairs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{DailyBar, MarketDataClient, Quote};
use crate::error::{Result, ToolError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The chart endpoint rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) agent-devui/0.1";

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Market data from Yahoo Finance
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol.trim())
        )
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult> {
        let response = self.client.get(self.chart_url(symbol)).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match parse_chart(&body, symbol) {
            Ok(result) => Ok(result),
            // Unknown symbols come back as 404 with a JSON error body
            Err(e @ ToolError::NoData(_)) => Err(e),
            Err(_) if !status.is_success() => Err(ToolError::Status(status.as_u16())),
            Err(e) => Err(e),
        }
    }
}

fn parse_chart(body: &str, symbol: &str) -> Result<ChartResult> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        let detail = if error.description.is_empty() {
            symbol.to_string()
        } else {
            format!("{} ({})", symbol, error.description)
        };
        return Err(ToolError::NoData(detail));
    }

    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ToolError::NoData(symbol.to_string()))
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).map(|d| d.round_dp(6))
}

fn at(series: &[Option<f64>], i: usize) -> Option<Decimal> {
    series.get(i).copied().flatten().and_then(to_decimal)
}

/// Daily bars from a chart result; sessions without open/close are skipped
fn bars_from(result: &ChartResult) -> Vec<DailyBar> {
    let Some(series) = result.indicators.quote.first() else {
        return Vec::new();
    };

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let local = ts.checked_add(result.meta.gmtoffset)?;
            let date = DateTime::from_timestamp(local, 0)?.date_naive();
            let open = at(&series.open, i)?;
            let close = at(&series.close, i)?;
            Some(DailyBar {
                date,
                open,
                high: at(&series.high, i).unwrap_or_else(|| open.max(close)),
                low: at(&series.low, i).unwrap_or_else(|| open.min(close)),
                close,
                volume: series.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect()
}

fn quote_from(result: &ChartResult) -> Result<Quote> {
    let series = result.indicators.quote.first();
    let open = series.and_then(|s| s.open.iter().flatten().copied().find_map(to_decimal));

    let price = result
        .meta
        .regular_market_price
        .and_then(to_decimal)
        .or_else(|| series.and_then(|s| s.close.iter().rev().flatten().copied().find_map(to_decimal)))
        .ok_or(ToolError::MissingField("regularMarketPrice"))?;

    Ok(Quote {
        symbol: result.meta.symbol.clone(),
        price,
        open,
        currency: result.meta.currency.clone(),
    })
}

fn midnight_timestamp(date: NaiveDate) -> Result<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ToolError::InvalidDate(date.to_string()))
}

#[async_trait]
impl MarketDataClient for YahooFinanceClient {
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyBar>> {
        let query = [
            ("period1", midnight_timestamp(start)?.to_string()),
            ("period2", midnight_timestamp(end)?.to_string()),
            ("interval", "1d".to_string()),
        ];

        let result = self.chart(symbol, &query).await?;
        Ok(bars_from(&result)
            .into_iter()
            .filter(|b| b.date >= start && b.date < end)
            .collect())
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let result = self.chart(symbol, &query).await?;
        quote_from(&result)
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HISTORY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "TSLA", "currency": "USD", "regularMarketPrice": 177.5, "gmtoffset": -14400},
                "timestamp": [1714570200, 1714656600, 1714743000],
                "indicators": {"quote": [{
                    "open":   [182.0, null, 186.65],
                    "high":   [185.86, null, 187.87],
                    "low":    [179.01, null, 180.0],
                    "close":  [179.99, null, 181.19],
                    "volume": [92829700, null, 96709900]
                }]}
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND: &str = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;

    #[test]
    fn test_bars_skip_empty_sessions() {
        let result = parse_chart(HISTORY, "TSLA").unwrap();
        let bars = bars_from(&result);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(bars[0].open, dec!(182));
        assert_eq!(bars[1].close, dec!(181.19));
        assert_eq!(bars[1].volume, 96_709_900);
    }

    #[test]
    fn test_quote_prefers_market_price() {
        let result = parse_chart(HISTORY, "TSLA").unwrap();
        let quote = quote_from(&result).unwrap();
        assert_eq!(quote.price, dec!(177.5));
        assert_eq!(quote.open, Some(dec!(182)));
        assert_eq!(quote.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_unknown_symbol_is_no_data() {
        let err = parse_chart(NOT_FOUND, "NOTREAL").unwrap_err();
        assert!(matches!(err, ToolError::NoData(ref d) if d.contains("delisted")));
    }

    #[test]
    fn test_out_of_range_timestamp_skipped() {
        let body = r#"{"chart": {"result": [{
            "meta": {"symbol": "TSLA", "gmtoffset": 3600},
            "timestamp": [9223372036854775807, 1714570200],
            "indicators": {"quote": [{"open": [1.0, 182.0], "close": [2.0, 179.99]}]}
        }]}}"#;

        let bars = bars_from(&parse_chart(body, "TSLA").unwrap());
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, dec!(182));
    }

    #[test]
    fn test_garbage_body_is_serialization_error() {
        assert!(matches!(parse_chart("<html>", "X"), Err(ToolError::Serialization(_))));
    }

    #[test]
    fn test_chart_url_encodes_symbol() {
        let client = YahooFinanceClient::new("https://example.test/").unwrap();
        assert_eq!(client.chart_url("USDKRW=X"), "https://example.test/v8/finance/chart/USDKRW%3DX");
    }
}
