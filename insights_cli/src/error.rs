use insights::error::InsightsError;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum InsightsCliError {
    #[error("Anyhow error")]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    InsightsError(#[from] InsightsError),
    #[error("polars error")]
    PolarsError(#[from] PolarsError),
    #[error("std IO error")]
    IOError(#[from] std::io::Error),
}

pub type InsightsCliResult<T> = Result<T, InsightsCliError>;
