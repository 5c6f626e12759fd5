//! Error types.

#[derive(thiserror::Error, Debug)]
pub enum InsightsError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Error loading GeoJSON: {0}")]
    BoundaryLoad(String),
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("Country not found: {0}")]
    CountryNotFound(String),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

pub type InsightsResult<T> = Result<T, InsightsError>;
