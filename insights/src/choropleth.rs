use std::collections::HashMap;

use geojson::Feature;
use log::debug;
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::InsightsResult;
use crate::geo::Boundaries;
use crate::COL;

pub const FILL_OPACITY: f64 = 0.7;
pub const LINE_OPACITY: f64 = 0.2;
pub const LINE_COLOR: &str = "#000000";

/// Six-class ColorBrewer palettes
const YL_OR_RD: [&str; 6] = [
    "#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026",
];
const BLUES: [&str; 6] = [
    "#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd", "#08519c",
];
const RD_YL_GN_R: [&str; 6] = [
    "#1a9850", "#91cf60", "#d9ef8b", "#fee08b", "#fc8d59", "#d73027",
];

/// Data categories offered by the category selector
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    Weather,
    #[strum(to_string = "Economic Indicators", serialize = "economic")]
    EconomicIndicators,
    #[strum(
        to_string = "Air Quality Index",
        serialize = "air-quality",
        serialize = "aqi"
    )]
    AirQualityIndex,
}

impl Category {
    /// Column of the global metrics table shown for this category
    pub fn column(&self) -> &'static str {
        match self {
            Category::Weather => COL::TEMPERATURE,
            Category::EconomicIndicators => COL::GDP_GROWTH,
            Category::AirQualityIndex => COL::AQI,
        }
    }

    pub fn palette(&self) -> &'static [&'static str; 6] {
        match self {
            Category::Weather => &YL_OR_RD,
            Category::EconomicIndicators => &BLUES,
            Category::AirQualityIndex => &RD_YL_GN_R,
        }
    }

    pub fn legend_title(&self) -> String {
        format!("{self} Data")
    }
}

/// Equal-width bins between the minimum and maximum of a column
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    palette: &'static [&'static str; 6],
}

impl ColorScale {
    /// `None` when there are no finite values to scale over
    pub fn from_values<I: IntoIterator<Item = f64>>(
        values: I,
        palette: &'static [&'static str; 6],
    ) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self { min, max, palette })
    }

    fn width(&self) -> f64 {
        (self.max - self.min) / self.palette.len() as f64
    }

    pub fn color(&self, value: f64) -> &'static str {
        let width = self.width();
        if width <= 0.0 {
            return self.palette[0];
        }
        let idx = ((value - self.min) / width).floor() as isize;
        self.palette[idx.clamp(0, self.palette.len() as isize - 1) as usize]
    }

    pub fn bins(&self) -> Vec<LegendBin> {
        let width = self.width();
        self.palette
            .iter()
            .enumerate()
            .map(|(i, color)| LegendBin {
                lower: self.min + width * i as f64,
                upper: self.min + width * (i + 1) as f64,
                color: color.to_string(),
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LegendBin {
    pub lower: f64,
    pub upper: f64,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub bins: Vec<LegendBin>,
}

/// A rendered choropleth: every boundary feature styled with simplestyle properties
#[derive(Debug, Clone)]
pub struct Choropleth {
    pub category: Category,
    pub legend: Legend,
    pub features: Vec<Feature>,
}

impl Choropleth {
    /// Number of features that received a fill color
    pub fn filled(&self) -> usize {
        self.features
            .iter()
            .filter(|f| f.contains_property("fill"))
            .count()
    }
}

/// `country -> value` for one metric column, skipping nulls and NaN
fn metric_lookup<'a>(table: &'a DataFrame, column: &str) -> InsightsResult<HashMap<&'a str, f64>> {
    let countries = table.column(COL::COUNTRY)?.str()?;
    let values = table.column(column)?.f64()?;
    Ok(countries
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(country, value)| Some((country?, value.filter(|v| !v.is_nan())?)))
        .collect())
}

/// Join the metrics table onto the boundaries by country name and color each boundary by the
/// category's column. Boundaries without a row are left unfilled; rows without a boundary are
/// dropped.
pub fn render_choropleth(
    boundaries: &Boundaries,
    table: &DataFrame,
    category: Category,
) -> InsightsResult<Choropleth> {
    let lookup = metric_lookup(table, category.column())?;
    let scale = ColorScale::from_values(lookup.values().copied(), category.palette());
    let names = boundaries.attributes.column(COL::SOVEREIGNT)?.str()?;

    let features: Vec<Feature> = boundaries
        .features
        .features
        .iter()
        .zip(names.into_iter())
        .map(|(feature, name)| {
            let mut feature = feature.clone();
            let value = name.and_then(|n| lookup.get(n).copied());
            feature.set_property(
                "tooltip",
                format!("Country: {}", name.unwrap_or_default()),
            );
            feature.set_property(category.column(), value.map_or(Value::Null, Value::from));
            feature.set_property("stroke", LINE_COLOR);
            feature.set_property("stroke-width", 1);
            feature.set_property("stroke-opacity", LINE_OPACITY);
            match (value, scale.as_ref()) {
                (Some(value), Some(scale)) => {
                    feature.set_property("fill", scale.color(value));
                    feature.set_property("fill-opacity", FILL_OPACITY);
                }
                _ => feature.set_property("fill-opacity", 0.0),
            }
            feature
        })
        .collect();

    let legend = Legend {
        title: category.legend_title(),
        bins: scale.map(|s| s.bins()).unwrap_or_default(),
    };
    let choropleth = Choropleth {
        category,
        legend,
        features,
    };
    debug!(
        "Rendered {} of {} boundaries for {category}",
        choropleth.filled(),
        choropleth.features.len()
    );
    Ok(choropleth)
}
