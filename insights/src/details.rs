use serde::{Deserialize, Serialize};

use crate::providers::{AirQualityRecord, EconomicRecord, WeatherRecord};

/// ISO code reported for boundaries without an `iso_a3` attribute
pub const MISSING_ISO_CODE: &str = "N/A";

/// Everything the details panel shows for one selected country
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CountryDetails {
    pub country: String,
    pub iso_a3: String,
    pub continent: Option<String>,
    /// (lat, lon) of the boundary centroid
    pub centroid: Option<(f64, f64)>,
    pub economic: EconomicRecord,
    pub weather: WeatherRecord,
    pub air_quality: AirQualityRecord,
}

impl CountryDetails {
    /// Headline metric of the panel, e.g. "2.8%"
    pub fn gdp_growth(&self) -> String {
        format!("{}%", format_decimal(self.economic.gdp_growth))
    }
}

/// Format with at least one decimal place so whole numbers read "3.0" rather than "3"
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
