//! wttr.in Client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CurrentConditions, WeatherClient};
use crate::error::{Result, ToolError};

pub const DEFAULT_BASE_URL: &str = "http://wttr.in";

#[derive(Deserialize)]
struct WttrReport {
    #[serde(default)]
    current_condition: Vec<WttrCondition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WttrCondition {
    #[serde(rename = "temp_C")]
    temp_c: Option<String>,
    humidity: Option<String>,
    #[serde(default)]
    weather_desc: Vec<WttrValue>,
}

#[derive(Deserialize)]
struct WttrValue {
    value: String,
}

/// Weather from wttr.in's `format=j1` JSON
pub struct WttrClient {
    client: Client,
    base_url: String,
}

impl WttrClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("agent-devui/0.1")
            .build()
            .map_err(|e| ToolError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, city: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(city.trim())
        )
    }
}

fn parse_report(body: &str) -> Result<CurrentConditions> {
    let report: WttrReport = serde_json::from_str(body)?;
    let current = report
        .current_condition
        .into_iter()
        .next()
        .ok_or(ToolError::MissingField("current_condition"))?;

    Ok(CurrentConditions {
        description: current
            .weather_desc
            .into_iter()
            .next()
            .map(|d| d.value.trim().to_string())
            .ok_or(ToolError::MissingField("weatherDesc"))?,
        temp_c: current.temp_c.ok_or(ToolError::MissingField("temp_C"))?,
        humidity: current.humidity.ok_or(ToolError::MissingField("humidity"))?,
    })
}

#[async_trait]
impl WeatherClient for WttrClient {
    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions> {
        let response = self
            .client
            .get(self.url(city))
            .query(&[("format", "j1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_report(&body)
    }

    fn name(&self) -> &str {
        "wttr.in"
    }
}
