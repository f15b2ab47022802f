//! Weather Integration
//!
//! Current conditions for a city, served by wttr.in in production.

mod mock;
mod wttr;

pub use mock::MockWeatherClient;
pub use wttr::{DEFAULT_BASE_URL, WttrClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Observed conditions at the time of the request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Short description, e.g. "Partly cloudy"
    pub description: String,

    /// Temperature in Celsius, as reported upstream
    pub temp_c: String,

    /// Relative humidity in percent
    pub humidity: String,
}

#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn current_conditions(&self, city: &str) -> Result<CurrentConditions>;

    fn name(&self) -> &str;
}
