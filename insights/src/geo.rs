use std::path::Path;

use crate::error::{InsightsError, InsightsResult};
use crate::COL;
use geo::{Geometry, GeometryCollection};
use geojson::{Feature, FeatureCollection, GeoJson};
use itertools::Itertools;
use log::{debug, info, warn};
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};

/// Country boundaries keyed by sovereign-state name.
///
/// `attributes`, `geometries` and `features` share row order: row `i` of the attribute frame
/// describes `geometries.0[i]` and `features.features[i]`.
#[derive(Debug, Clone)]
pub struct Boundaries {
    /// `SOVEREIGNT`, `iso_a3` and `CONTINENT` for every boundary
    pub attributes: DataFrame,
    pub geometries: GeometryCollection<f64>,
    pub features: FeatureCollection,
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

impl Boundaries {
    /// Parse a GeoJSON `FeatureCollection` of country boundaries. Features without a geometry
    /// are skipped.
    pub fn from_geojson_str(text: &str) -> InsightsResult<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| InsightsError::BoundaryLoad(e.to_string()))?;
        let collection = FeatureCollection::try_from(geojson)
            .map_err(|e| InsightsError::BoundaryLoad(e.to_string()))?;

        let mut names: Vec<Option<String>> = vec![];
        let mut iso_codes: Vec<Option<String>> = vec![];
        let mut continents: Vec<Option<String>> = vec![];
        let mut geometries: Vec<Geometry<f64>> = vec![];
        let mut features: Vec<Feature> = vec![];

        for feature in collection.features {
            let name = string_property(&feature, COL::SOVEREIGNT);
            let Some(geometry) = feature.geometry.clone() else {
                warn!("Skipping boundary without geometry: {name:?}");
                continue;
            };
            let geometry = Geometry::<f64>::try_from(geometry)
                .map_err(|e| InsightsError::BoundaryLoad(format!("{name:?}: {e}")))?;
            iso_codes.push(string_property(&feature, COL::ISO_A3));
            continents.push(string_property(&feature, COL::CONTINENT));
            names.push(name);
            geometries.push(geometry);
            features.push(feature);
        }

        let attributes = DataFrame::new(vec![
            Series::new(COL::SOVEREIGNT, names),
            Series::new(COL::ISO_A3, iso_codes),
            Series::new(COL::CONTINENT, continents),
        ])?;
        debug!("Loaded boundaries with shape: {:?}", attributes.shape());

        Ok(Self {
            attributes,
            geometries: GeometryCollection(geometries),
            features: FeatureCollection {
                bbox: collection.bbox,
                features,
                foreign_members: None,
            },
        })
    }

    /// Read boundaries from a local GeoJSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> InsightsResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            InsightsError::BoundaryLoad(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_geojson_str(&text)
    }

    pub fn len(&self) -> usize {
        self.attributes.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct non-null country names in first-appearance order
    pub fn country_names(&self) -> InsightsResult<Vec<String>> {
        Ok(self
            .attributes
            .column(COL::SOVEREIGNT)?
            .str()?
            .into_iter()
            .flatten()
            .unique()
            .map(str::to_string)
            .collect())
    }

    /// Index of the first boundary row carrying this country name, optionally restricted to
    /// one continent
    pub fn position(
        &self,
        country: &str,
        continent: Option<&str>,
    ) -> InsightsResult<Option<usize>> {
        let names = self.attributes.column(COL::SOVEREIGNT)?.str()?;
        let continents = self.attributes.column(COL::CONTINENT)?.str()?;
        Ok(names
            .into_iter()
            .zip(continents.into_iter())
            .position(|(name, c)| {
                name == Some(country) && continent.map_or(true, |wanted| c == Some(wanted))
            }))
    }

    pub fn geometry(&self, index: usize) -> Option<&Geometry<f64>> {
        self.geometries.0.get(index)
    }
}

/// Make sure a local copy of the boundary dataset exists, downloading it from `url` if not.
/// Returns whether a download happened.
pub async fn ensure_local_copy(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> InsightsResult<bool> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Using local boundary file {}", path.display());
        return Ok(false);
    }
    info!("Attempting to download boundaries from {url}");
    let download_error = |reason: String| InsightsError::Download {
        url: url.to_string(),
        reason,
    };
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| download_error(e.to_string()))?
        .bytes()
        .await
        .map_err(|e| download_error(e.to_string()))?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| download_error(format!("could not save to {}: {e}", path.display())))?;
    info!("Downloaded world map data to {}", path.display());
    Ok(true)
}

/// Load boundaries from `path`, fetching them from `url` first when there is no local copy.
pub async fn load_boundaries(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> InsightsResult<Boundaries> {
    ensure_local_copy(client, url, path).await?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || Boundaries::from_path(path))
        .await
        .map_err(|e| InsightsError::BoundaryLoad(e.to_string()))?
}
