use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::providers::EconomicRecord;

pub const WEATHER_API_KEY_ENV: &str = "INSIGHTS_WEATHER_API_KEY";
pub const AIR_QUALITY_API_KEY_ENV: &str = "INSIGHTS_AIR_QUALITY_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where to fetch the boundary dataset from when no local copy exists
    pub boundaries_url: String,
    /// Local copy of the boundary dataset
    pub boundaries_path: PathBuf,
    pub boundaries_ttl_secs: u64,
    /// Unset leaves the HTTP client without a timeout
    pub request_timeout_secs: Option<u64>,
    pub weather: WeatherConfig,
    pub air_quality: AirQualityConfig,
    pub economic: EconomicConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            boundaries_url: "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_admin_0_countries.geojson".into(),
            boundaries_path: "ne_110m_admin_0_countries.geojson".into(),
            boundaries_ttl_secs: 3600,
            request_timeout_secs: None,
            weather: WeatherConfig::default(),
            air_quality: AirQualityConfig::default(),
            economic: EconomicConfig::default(),
        }
    }
}

impl Config {
    /// Apply API keys from the environment on top of whatever was read from file
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(WEATHER_API_KEY_ENV) {
            debug!("using weather API key from {WEATHER_API_KEY_ENV}");
            self.weather.api_key = key.trim().to_string();
        }
        if let Ok(key) = std::env::var(AIR_QUALITY_API_KEY_ENV) {
            debug!("using air quality API key from {AIR_QUALITY_API_KEY_ENV}");
            self.air_quality.api_key = key.trim().to_string();
        }
        self
    }

    pub fn boundaries_ttl(&self) -> Duration {
        Duration::from_secs(self.boundaries_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    pub url: String,
    pub api_key: String,
    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openweathermap.org/data/2.5/weather".into(),
            api_key: String::new(),
            cache_ttl_secs: 600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AirQualityConfig {
    pub base_url: String,
    pub api_key: String,
    pub cache_ttl_secs: u64,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.waqi.info".into(),
            api_key: String::new(),
            cache_ttl_secs: 3600,
        }
    }
}

/// Static economic indicators keyed by ISO-3 code
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EconomicConfig {
    pub cache_ttl_secs: u64,
    pub indicators: BTreeMap<String, EconomicRecord>,
}

impl Default for EconomicConfig {
    fn default() -> Self {
        let indicators = BTreeMap::from([
            (
                "USA".to_string(),
                EconomicRecord {
                    gdp_growth: 2.8,
                    inflation: 3.1,
                    unemployment: 4.2,
                    stock_index: "S&P 500: 4,912.21".into(),
                },
            ),
            (
                "IND".to_string(),
                EconomicRecord {
                    gdp_growth: 6.7,
                    inflation: 5.5,
                    unemployment: 7.8,
                    stock_index: "SENSEX: 72,456.10".into(),
                },
            ),
        ]);
        Self {
            cache_ttl_secs: 86400,
            indicators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_should_fill_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"boundaries_ttl_secs": 60, "weather": {"api_key": "abc"}}"#,
        )
        .unwrap();
        assert_eq!(config.boundaries_ttl(), Duration::from_secs(60));
        assert_eq!(config.weather.api_key, "abc");
        assert_eq!(config.weather.cache_ttl_secs, 600);
        assert_eq!(config.air_quality, AirQualityConfig::default());
        assert_eq!(config.economic.indicators.len(), 2);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn request_timeout_should_only_apply_when_set() {
        assert_eq!(Config::default().request_timeout(), None);
        let config: Config = serde_json::from_str(r#"{"request_timeout_secs": 30}"#).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(crate::Dashboard::new_with_config(config).is_ok());
    }

    #[test]
    fn default_economic_table_should_cover_usa_and_india() {
        let config = EconomicConfig::default();
        assert_eq!(config.indicators["USA"].gdp_growth, 2.8);
        assert_eq!(config.indicators["IND"].stock_index, "SENSEX: 72,456.10");
    }
}
