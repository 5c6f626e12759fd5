//! This module stores the column names used by the boundary attribute frame and the global
//! metrics table. The boundary names must stay in sync with the attribute keys of the Natural
//! Earth admin-0 dataset!

pub const SOVEREIGNT: &str = "SOVEREIGNT";
pub const ISO_A3: &str = "iso_a3";
pub const CONTINENT: &str = "CONTINENT";

pub const COUNTRY: &str = "country";
pub const TEMPERATURE: &str = "temperature";
pub const GDP_GROWTH: &str = "gdp_growth";
pub const AQI: &str = "aqi";
