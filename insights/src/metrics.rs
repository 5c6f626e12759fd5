//! The global metrics table: one row per country with a temperature, GDP growth and air quality
//! column. Values currently come from a placeholder generator; anything implementing
//! [`MetricsSource`] can stand in for it.

use std::ops::RangeInclusive;

use log::debug;
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::InsightsResult;
use crate::geo::Boundaries;
use crate::COL;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 5.0..=35.0;
pub const GDP_GROWTH_RANGE: RangeInclusive<f64> = -2.0..=8.0;
pub const AQI_RANGE: RangeInclusive<f64> = 10.0..=150.0;

/// Something that can produce the global metrics table for a set of boundaries.
///
/// Implementations must return exactly one row per distinct country name in `boundaries`, with
/// the columns `country`, `temperature`, `gdp_growth` and `aqi`.
pub trait MetricsSource {
    fn build_table(&self, boundaries: &Boundaries) -> InsightsResult<DataFrame>;
}

/// Uniform random placeholder values
#[derive(Debug, Clone, Default)]
pub struct RandomMetrics {
    seed: Option<u64>,
}

impl RandomMetrics {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

fn sample(rng: &mut StdRng, range: &RangeInclusive<f64>, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(range.clone())).collect()
}

impl MetricsSource for RandomMetrics {
    fn build_table(&self, boundaries: &Boundaries) -> InsightsResult<DataFrame> {
        let countries = boundaries.country_names()?;
        let n = countries.len();
        let mut rng = self.rng();
        let temperature = sample(&mut rng, &TEMPERATURE_RANGE, n);
        let gdp_growth = sample(&mut rng, &GDP_GROWTH_RANGE, n);
        let aqi = sample(&mut rng, &AQI_RANGE, n);

        let table = DataFrame::new(vec![
            Series::new(COL::COUNTRY, countries),
            Series::new(COL::TEMPERATURE, temperature),
            Series::new(COL::GDP_GROWTH, gdp_growth),
            Series::new(COL::AQI, aqi),
        ])?;
        debug!("Generated global metrics with shape: {:?}", table.shape());
        Ok(table)
    }
}

/// Build the global metrics table for `boundaries` from `source`
pub fn build_global_table<S: MetricsSource + ?Sized>(
    source: &S,
    boundaries: &Boundaries,
) -> InsightsResult<DataFrame> {
    source.build_table(boundaries)
}
