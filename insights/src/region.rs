use itertools::Itertools;
use polars::prelude::{BooleanChunked, DataFrame};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::InsightsResult;
use crate::geo::Boundaries;
use crate::COL;

/// Regions offered by the region selector. Everything except `Global` matches the `CONTINENT`
/// attribute of the boundary dataset verbatim.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Region {
    Global,
    #[strum(to_string = "North America", serialize = "north-america")]
    NorthAmerica,
    #[strum(to_string = "South America", serialize = "south-america")]
    SouthAmerica,
    Europe,
    Asia,
    Africa,
    Oceania,
}

impl Region {
    /// The `CONTINENT` value this region selects, `None` for `Global`
    pub fn continent(&self) -> Option<String> {
        match self {
            Region::Global => None,
            other => Some(other.to_string()),
        }
    }
}

/// Boundary attribute rows in `region`. `Global` returns every row.
pub fn filter_by_region(boundaries: &Boundaries, region: Region) -> InsightsResult<DataFrame> {
    let Some(continent) = region.continent() else {
        return Ok(boundaries.attributes.clone());
    };
    let mask: BooleanChunked = boundaries
        .attributes
        .column(COL::CONTINENT)?
        .str()?
        .into_iter()
        .map(|value| value == Some(continent.as_str()))
        .collect();
    Ok(boundaries.attributes.filter(&mask)?)
}

/// Names for the country selector: distinct, non-null and sorted alphabetically
pub fn country_list(subset: &DataFrame) -> InsightsResult<Vec<String>> {
    Ok(subset
        .column(COL::SOVEREIGNT)?
        .str()?
        .into_iter()
        .flatten()
        .unique()
        .sorted()
        .map(str::to_string)
        .collect())
}
