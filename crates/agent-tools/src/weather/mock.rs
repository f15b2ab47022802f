//! Mock Weather Client

use std::collections::HashMap;

use async_trait::async_trait;

use super::{CurrentConditions, WeatherClient};
use crate::error::{Result, ToolError};

/// Canned conditions keyed by lower-case city; unknown cities answer HTTP 404
#[derive(Default)]
pub struct MockWeatherClient {
    cities: HashMap<String, CurrentConditions>,
}

impl MockWeatherClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: &str, description: &str, temp_c: i32, humidity: u8) -> Self {
        self.cities.insert(
            city.trim().to_lowercase(),
            CurrentConditions {
                description: description.to_string(),
                temp_c: temp_c.to_string(),
                humidity: humidity.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl WeatherClient for MockWeatherClient {
    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions> {
        self.cities
            .get(&city.trim().to_lowercase())
            .cloned()
            .ok_or(ToolError::Status(404))
    }

    fn name(&self) -> &str {
        "MockWeather"
    }
}
