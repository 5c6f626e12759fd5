use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{coordinate_key, AirQualityRecord, ProviderError};
use crate::cache::TtlCache;
use crate::config::AirQualityConfig;

/// WAQI geo feed body. On errors WAQI still answers 200 but with `"status": "error"` and a
/// string in `data`, which fails to deserialize here.
#[derive(Debug, Deserialize)]
struct WaqiResponse {
    #[serde(default)]
    status: String,
    data: WaqiData,
}

#[derive(Debug, Deserialize)]
struct WaqiData {
    // Stations without a reading report "-", which is rejected as malformed
    aqi: u32,
    #[serde(rename = "dominentpol")]
    dominant_pollutant: String,
}

pub struct AirQualityProvider {
    client: reqwest::Client,
    config: AirQualityConfig,
    cache: TtlCache<String, AirQualityRecord>,
}

impl AirQualityProvider {
    pub fn new(client: reqwest::Client, config: AirQualityConfig) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            client,
            config,
            cache,
        }
    }

    fn feed_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/feed/geo:{lat};{lon}/?token={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key
        )
    }

    /// Air quality index nearest to the coordinates, or the fallback record on any failure.
    pub async fn get_air_quality(&self, lat: f64, lon: f64) -> AirQualityRecord {
        let key = coordinate_key(lat, lon);
        if let Some(record) = self.cache.get(&key).await {
            debug!("air quality cache hit for {key}");
            return record;
        }
        match self.fetch(lat, lon).await {
            Ok(record) => {
                self.cache.insert(key, record.clone()).await;
                record
            }
            Err(e) => {
                warn!("Error fetching air quality data for {key}: {e}");
                AirQualityRecord::fallback()
            }
        }
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<AirQualityRecord, ProviderError> {
        let response = self.client.get(self.feed_url(lat, lon)).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ProviderError::Status(response.status()));
        }
        let body: WaqiResponse = response.json().await?;
        if body.status == "error" {
            return Err(ProviderError::Malformed("WAQI reported an error".into()));
        }
        Ok(AirQualityRecord {
            aqi: body.data.aqi,
            dominant_pollutant: body.data.dominant_pollutant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(base_url: String) -> AirQualityProvider {
        AirQualityProvider::new(
            reqwest::Client::new(),
            AirQualityConfig {
                base_url,
                api_key: "token123".into(),
                cache_ttl_secs: 3600,
            },
        )
    }

    #[test]
    fn feed_url_should_follow_the_geo_feed_layout() {
        let provider = provider("https://api.waqi.info/".into());
        assert_eq!(
            provider.feed_url(28.6, 77.2),
            "https://api.waqi.info/feed/geo:28.6;77.2/?token=token123"
        );
    }

    #[tokio::test]
    async fn air_quality_should_be_parsed_and_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/feed/geo:")
                    .query_param("token", "token123");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "data": {"aqi": 153, "idx": 2556, "dominentpol": "pm10"}
                }));
            })
            .await;

        let provider = provider(server.base_url());
        let first = provider.get_air_quality(28.6, 77.2).await;
        let second = provider.get_air_quality(28.6, 77.2).await;
        assert_eq!(
            first,
            AirQualityRecord {
                aqi: 153,
                dominant_pollutant: "pm10".into()
            }
        );
        assert_eq!(first, second);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn error_status_in_body_should_fall_back() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/feed/");
                then.status(200)
                    .json_body(json!({"status": "error", "data": "Invalid key"}));
            })
            .await;

        let record = provider(server.base_url()).get_air_quality(1.0, 2.0).await;
        assert_eq!(record, AirQualityRecord::fallback());
    }

    #[tokio::test]
    async fn missing_reading_should_fall_back() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/feed/");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "data": {"aqi": "-", "dominentpol": ""}
                }));
            })
            .await;

        let record = provider(server.base_url()).get_air_quality(1.0, 2.0).await;
        assert_eq!(record, AirQualityRecord::fallback());
    }

    #[tokio::test]
    async fn server_error_should_fall_back() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/feed/");
                then.status(500);
            })
            .await;

        let record = provider(server.base_url()).get_air_quality(1.0, 2.0).await;
        assert_eq!(record, AirQualityRecord::fallback());
    }

    #[tokio::test]
    async fn transport_failure_should_fall_back() {
        let record = provider("http://127.0.0.1:1".into())
            .get_air_quality(1.0, 2.0)
            .await;
        assert_eq!(record, AirQualityRecord::fallback());
    }
}
