//! Current Weather Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use super::into_result;
use crate::error::ToolError;
use crate::weather::WeatherClient;

pub struct WeatherTool {
    client: Arc<dyn WeatherClient>,
}

impl WeatherTool {
    pub const NAME: &'static str = "get_current_weather";

    pub fn new(client: Arc<dyn WeatherClient>) -> Self {
        Self { client }
    }

    /// Describe the current weather in `city`
    pub async fn current_weather(&self, city: &str) -> String {
        tracing::info!(city, "tool: getting current weather");

        let city = city.trim();
        match self.client.current_conditions(city).await {
            Ok(c) => format!(
                "The current weather in {} is {} with a temperature of {}°C and humidity of {}%.",
                city, c.description, c.temp_c, c.humidity
            ),
            Err(ToolError::Status(status)) => {
                tracing::warn!(city, status, "weather upstream rejected request");
                "Error fetching weather data".to_string()
            }
            Err(e) => format!("Error fetching weather data: {}", e),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Fetches the current weather for a given city.".into(),
            parameters: vec![ParameterSchema::string(
                "city",
                "The name of the city to fetch the weather for. The city must be in English, e.g., 'Seoul' or 'New York'.",
            )],
            category: Some("weather".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let city = call.str_arg("city").unwrap_or_default();
        Ok(into_result(Self::NAME, self.current_weather(city).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::MockWeatherClient;

    fn tool() -> WeatherTool {
        WeatherTool::new(Arc::new(MockWeatherClient::new().with_city("New York", "Light rain", 12, 87)))
    }

    #[tokio::test]
    async fn test_weather_sentence() {
        let text = tool().current_weather("New York").await;
        assert_eq!(
            text,
            "The current weather in New York is Light rain with a temperature of 12°C and humidity of 87%."
        );
    }

    #[tokio::test]
    async fn test_upstream_status_is_bare_error() {
        let result = tool().execute(&ToolCall::new(WeatherTool::NAME).arg("city", "Atlantis")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Error fetching weather data");
    }
}
