use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{coordinate_key, ProviderError, WeatherRecord};
use crate::cache::TtlCache;
use crate::config::WeatherConfig;

/// OpenWeatherMap current weather body, only the fields we read
#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    wind: OwmWind,
    weather: Vec<OwmDescription>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmDescription {
    description: String,
}

impl TryFrom<OwmResponse> for WeatherRecord {
    type Error = ProviderError;

    fn try_from(value: OwmResponse) -> Result<Self, Self::Error> {
        let description = value
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| ProviderError::Malformed("empty `weather` array".into()))?;
        Ok(WeatherRecord {
            temperature: value.main.temp,
            humidity: value.main.humidity,
            pressure: value.main.pressure,
            wind_speed: value.wind.speed,
            description,
        })
    }
}

pub struct WeatherProvider {
    client: reqwest::Client,
    config: WeatherConfig,
    cache: TtlCache<String, WeatherRecord>,
}

impl WeatherProvider {
    pub fn new(client: reqwest::Client, config: WeatherConfig) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            client,
            config,
            cache,
        }
    }

    /// Current weather at the given coordinates, or the fallback record if the API can't be
    /// reached or answers with anything unexpected.
    pub async fn get_weather(&self, lat: f64, lon: f64) -> WeatherRecord {
        let key = coordinate_key(lat, lon);
        if let Some(record) = self.cache.get(&key).await {
            debug!("weather cache hit for {key}");
            return record;
        }
        match self.fetch(lat, lon).await {
            Ok(record) => {
                self.cache.insert(key, record.clone()).await;
                record
            }
            Err(e) => {
                warn!("Error fetching weather data for {key}: {e}");
                WeatherRecord::fallback()
            }
        }
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherRecord, ProviderError> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.config.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(ProviderError::Status(response.status()));
        }
        let body: OwmResponse = response.json().await?;
        body.try_into()
    }
}
