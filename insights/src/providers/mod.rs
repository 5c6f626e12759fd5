//! Per-country metric lookups.
//!
//! Each provider answers a lookup with a small fixed-shape record and never fails outward: any
//! transport, status or parse problem is logged and replaced by the provider's fallback record.

use serde::{Deserialize, Serialize};

pub mod air_quality;
pub mod economic;
pub mod weather;

pub use air_quality::AirQualityProvider;
pub use economic::EconomicProvider;
pub use weather::WeatherProvider;

/// Internal failure of a provider lookup. Never leaves this module's public API.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub description: String,
}

impl WeatherRecord {
    pub fn fallback() -> Self {
        Self {
            temperature: 22.5,
            humidity: 65.0,
            pressure: 1013.0,
            wind_speed: 5.2,
            description: "Partly cloudy".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EconomicRecord {
    pub gdp_growth: f64,
    pub inflation: f64,
    pub unemployment: f64,
    pub stock_index: String,
}

impl EconomicRecord {
    pub fn fallback() -> Self {
        Self {
            gdp_growth: 1.5,
            inflation: 3.0,
            unemployment: 5.0,
            stock_index: "N/A".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AirQualityRecord {
    pub aqi: u32,
    pub dominant_pollutant: String,
}

impl AirQualityRecord {
    pub fn fallback() -> Self {
        Self {
            aqi: 45,
            dominant_pollutant: "pm25".into(),
        }
    }
}

/// Cache key for a coordinate pair (rounded to 4 decimal places)
fn coordinate_key(lat: f64, lon: f64) -> String {
    format!("{lat:.4},{lon:.4}")
}
