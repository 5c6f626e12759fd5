use std::sync::Arc;

use ::geo::Centroid;
use log::debug;
use polars::frame::DataFrame;

use crate::cache::TtlCache;
use crate::choropleth::{render_choropleth, Category, Choropleth};
use crate::config::Config;
use crate::details::{CountryDetails, MISSING_ISO_CODE};
use crate::error::{InsightsError, InsightsResult};
use crate::geo::Boundaries;
use crate::metrics::{build_global_table, MetricsSource, RandomMetrics};
use crate::providers::{
    AirQualityProvider, AirQualityRecord, EconomicProvider, WeatherProvider, WeatherRecord,
};
use crate::region::{country_list, filter_by_region, Region};

// Re-exports
pub use column_names as COL;

// Modules
pub mod cache;
pub mod choropleth;
pub mod column_names;
pub mod config;
pub mod details;
pub mod error;
pub mod formatters;
pub mod geo;
pub mod metrics;
pub mod providers;
pub mod region;

/// Type for the dashboard data and API. Holds the process-wide caches, so build one and reuse
/// it for every render.
pub struct Dashboard {
    pub config: Config,
    client: reqwest::Client,
    boundaries: TtlCache<(), Arc<Boundaries>>,
    global_table: TtlCache<(), Arc<DataFrame>>,
    metrics_source: Box<dyn MetricsSource + Send + Sync>,
    pub weather: WeatherProvider,
    pub economic: EconomicProvider,
    pub air_quality: AirQualityProvider,
}

impl Dashboard {
    /// Setup the Dashboard object with default configuration
    pub fn new() -> InsightsResult<Self> {
        Self::new_with_config(Config::default())
    }

    /// Setup the Dashboard object with custom configuration
    pub fn new_with_config(config: Config) -> InsightsResult<Self> {
        debug!("config: {config:?}");
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(anyhow::Error::from)?;
        Ok(Self {
            boundaries: TtlCache::new(config.boundaries_ttl()),
            global_table: TtlCache::new(config.boundaries_ttl()),
            metrics_source: Box::new(RandomMetrics::default()),
            weather: WeatherProvider::new(client.clone(), config.weather.clone()),
            economic: EconomicProvider::new(config.economic.clone()),
            air_quality: AirQualityProvider::new(client.clone(), config.air_quality.clone()),
            client,
            config,
        })
    }

    /// Replace the placeholder metrics generator
    pub fn with_metrics_source<S>(mut self, source: S) -> Self
    where
        S: MetricsSource + Send + Sync + 'static,
    {
        self.metrics_source = Box::new(source);
        self
    }

    /// Country boundaries, read from disk (downloading first if needed) at most once per
    /// cache window
    pub async fn boundaries(&self) -> InsightsResult<Arc<Boundaries>> {
        if let Some(boundaries) = self.boundaries.get(&()).await {
            return Ok(boundaries);
        }
        let boundaries = Arc::new(
            crate::geo::load_boundaries(
                &self.client,
                &self.config.boundaries_url,
                &self.config.boundaries_path,
            )
            .await?,
        );
        self.boundaries.insert((), boundaries.clone()).await;
        Ok(boundaries)
    }

    /// The global metrics table, regenerated once per cache window
    pub async fn global_table(&self) -> InsightsResult<Arc<DataFrame>> {
        if let Some(table) = self.global_table.get(&()).await {
            return Ok(table);
        }
        let boundaries = self.boundaries().await?;
        let table = Arc::new(build_global_table(
            self.metrics_source.as_ref(),
            &boundaries,
        )?);
        self.global_table.insert((), table.clone()).await;
        Ok(table)
    }

    /// Boundary attribute rows for a region
    pub async fn region(&self, region: Region) -> InsightsResult<DataFrame> {
        let boundaries = self.boundaries().await?;
        filter_by_region(&boundaries, region)
    }

    /// Sorted country names for the country selector
    pub async fn countries(&self, region: Region) -> InsightsResult<Vec<String>> {
        country_list(&self.region(region).await?)
    }

    /// Choropleth of the global metrics table for `category`
    pub async fn choropleth(&self, category: Category) -> InsightsResult<Choropleth> {
        let boundaries = self.boundaries().await?;
        let table = self.global_table().await?;
        render_choropleth(&boundaries, &table, category)
    }

    /// Details panel for a country selected from `region`
    pub async fn country_details(
        &self,
        country: &str,
        region: Region,
    ) -> InsightsResult<CountryDetails> {
        let boundaries = self.boundaries().await?;
        let index = boundaries
            .position(country, region.continent().as_deref())?
            .ok_or_else(|| InsightsError::CountryNotFound(format!("{country} ({region})")))?;
        let iso_codes = boundaries.attributes.column(COL::ISO_A3)?.str()?;
        let continents = boundaries.attributes.column(COL::CONTINENT)?.str()?;

        let iso_a3 = iso_codes
            .get(index)
            .map(str::to_string)
            .unwrap_or_else(|| MISSING_ISO_CODE.to_string());
        let continent = continents.get(index).map(str::to_string);
        let centroid = boundaries
            .geometry(index)
            .and_then(|geometry| geometry.centroid())
            .map(|point| (point.y(), point.x()));
        debug!("Selected {country} ({iso_a3}) with centroid {centroid:?}");

        let (economic, (weather, air_quality)) = tokio::join!(
            self.economic.get_economic(&iso_a3),
            async {
                match centroid {
                    Some((lat, lon)) => tokio::join!(
                        self.weather.get_weather(lat, lon),
                        self.air_quality.get_air_quality(lat, lon)
                    ),
                    None => (WeatherRecord::fallback(), AirQualityRecord::fallback()),
                }
            }
        );

        Ok(CountryDetails {
            country: country.to_string(),
            iso_a3,
            continent,
            centroid,
            economic,
            weather,
            air_quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::COUNTRIES;
    use crate::providers::EconomicRecord;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Config pointing at a local copy of the test boundaries and at `server` for both APIs
    fn test_config(dir: &TempDir, server: &MockServer) -> Config {
        let boundaries_path = dir.path().join("countries.geojson");
        std::fs::write(&boundaries_path, COUNTRIES).unwrap();
        let mut config = Config {
            boundaries_url: server.url("/countries.geojson"),
            boundaries_path,
            ..Config::default()
        };
        config.weather.url = server.url("/data/2.5/weather");
        config.weather.api_key = "weather-key".into();
        config.air_quality.base_url = server.base_url();
        config.air_quality.api_key = "aqi-key".into();
        config
    }

    async fn mock_apis(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
        let weather = server
            .mock_async(|when, then| {
                when.method(GET).path("/data/2.5/weather");
                then.status(200).json_body(json!({
                    "weather": [{"description": "light rain"}],
                    "main": {"temp": 24.1, "pressure": 1009, "humidity": 81},
                    "wind": {"speed": 2.1}
                }));
            })
            .await;
        let air_quality = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/feed/geo:");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "data": {"aqi": 162, "dominentpol": "pm25"}
                }));
            })
            .await;
        (weather, air_quality)
    }

    #[tokio::test]
    async fn boundaries_should_be_cached_within_the_window() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &server);
        let path = config.boundaries_path.clone();
        let dashboard = Dashboard::new_with_config(config).unwrap();

        let first = dashboard.boundaries().await.unwrap();
        std::fs::remove_file(path).unwrap();
        let second = dashboard.boundaries().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second), "Disk is not read again");
    }

    #[tokio::test]
    async fn missing_dataset_should_be_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/countries.geojson");
                then.status(503);
            })
            .await;
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, &server);
        config.boundaries_path = dir.path().join("absent.geojson");
        let dashboard = Dashboard::new_with_config(config).unwrap();

        assert!(matches!(
            dashboard.boundaries().await,
            Err(InsightsError::Download { .. })
        ));
        assert!(dashboard.choropleth(Category::Weather).await.is_err());
    }

    #[tokio::test]
    async fn global_table_should_be_stable_within_the_window() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        let first = dashboard.global_table().await.unwrap();
        let second = dashboard.global_table().await.unwrap();
        assert!(first.equals(&second));
        assert_eq!(first.height(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn caches_should_be_rebuilt_after_the_window() {
        let dir = TempDir::new().unwrap();
        let boundaries_path = dir.path().join("countries.geojson");
        std::fs::write(&boundaries_path, COUNTRIES).unwrap();
        let config = Config {
            boundaries_path,
            ..Config::default()
        };
        let ttl = config.boundaries_ttl();
        let dashboard = Dashboard::new_with_config(config).unwrap();

        let boundaries = dashboard.boundaries().await.unwrap();
        let table = dashboard.global_table().await.unwrap();

        tokio::time::advance(ttl - Duration::from_secs(1)).await;
        assert!(Arc::ptr_eq(&boundaries, &dashboard.boundaries().await.unwrap()));
        assert!(Arc::ptr_eq(&table, &dashboard.global_table().await.unwrap()));

        tokio::time::advance(Duration::from_secs(2)).await;
        let reloaded = dashboard.boundaries().await.unwrap();
        let regenerated = dashboard.global_table().await.unwrap();
        assert!(!Arc::ptr_eq(&boundaries, &reloaded), "Boundaries are read again");
        assert!(!Arc::ptr_eq(&table, &regenerated), "Table is rebuilt");
        assert_eq!(regenerated.height(), table.height());
        assert!(!regenerated.equals(&table), "Fresh random values");
    }

    #[tokio::test]
    async fn choropleth_should_cover_every_boundary() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server))
            .unwrap()
            .with_metrics_source(RandomMetrics::new(Some(3)));

        let map = dashboard
            .choropleth(Category::AirQualityIndex)
            .await
            .unwrap();
        assert_eq!(map.features.len(), 9);
        assert_eq!(map.filled(), 9);
    }

    #[tokio::test]
    async fn countries_should_follow_the_region() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        assert_eq!(
            dashboard.countries(Region::Africa).await.unwrap(),
            vec!["Kenya"]
        );
        assert_eq!(dashboard.region(Region::Europe).await.unwrap().height(), 3);
    }

    #[tokio::test]
    async fn details_should_combine_all_providers() {
        let server = MockServer::start_async().await;
        let (weather, air_quality) = mock_apis(&server).await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        let details = dashboard
            .country_details("India", Region::Asia)
            .await
            .unwrap();
        assert_eq!(details.iso_a3, "IND");
        assert_eq!(details.gdp_growth(), "6.7%");
        assert_eq!(details.weather.description, "light rain");
        assert_eq!(details.air_quality.aqi, 162);
        let (lat, lon) = details.centroid.unwrap();
        assert!((lat - 22.0).abs() < 1e-6 && (lon - 79.0).abs() < 1e-6);

        // A second selection of the same country is served from the caches
        dashboard
            .country_details("India", Region::Global)
            .await
            .unwrap();
        weather.assert_hits_async(1).await;
        air_quality.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn missing_iso_code_should_use_default_indicators() {
        let server = MockServer::start_async().await;
        mock_apis(&server).await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        let details = dashboard
            .country_details("Kosovo", Region::Europe)
            .await
            .unwrap();
        assert_eq!(details.iso_a3, "N/A");
        assert_eq!(details.economic, EconomicRecord::fallback());
        assert_eq!(details.gdp_growth(), "1.5%");
    }

    #[tokio::test]
    async fn details_should_use_the_boundary_in_the_selected_region() {
        let server = MockServer::start_async().await;
        mock_apis(&server).await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        let greenland = dashboard
            .country_details("Denmark", Region::NorthAmerica)
            .await
            .unwrap();
        assert_eq!(greenland.iso_a3, "GRL");
        let denmark = dashboard
            .country_details("Denmark", Region::Europe)
            .await
            .unwrap();
        assert_eq!(denmark.iso_a3, "DNK");
    }

    #[tokio::test]
    async fn country_outside_the_region_should_not_be_found() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let dashboard = Dashboard::new_with_config(test_config(&dir, &server)).unwrap();

        let result = dashboard.country_details("Kenya", Region::Europe).await;
        assert!(matches!(result, Err(InsightsError::CountryNotFound(_))));
    }
}
