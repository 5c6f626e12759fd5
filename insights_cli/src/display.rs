use comfy_table::{presets::NOTHING, *};
use itertools::izip;

use insights::{
    details::{format_decimal, CountryDetails},
    COL,
};
use polars::frame::DataFrame;

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

pub fn countries_table(countries: &[String]) -> Table {
    let mut table = styled_table();
    table.set_header(vec![Cell::new("Country").add_attribute(Attribute::Bold)]);
    for country in countries {
        table.add_row(vec![country]);
    }
    table
}

pub fn display_countries(countries: &[String]) {
    println!("\n{}", countries_table(countries));
}

pub fn metrics_table(metrics: &DataFrame, max_results: Option<usize>) -> anyhow::Result<Table> {
    let df_to_show = match max_results {
        Some(max) => metrics.head(Some(max)),
        None => metrics.clone(),
    };
    let mut table = styled_table();
    table.set_header(vec![
        Cell::new("Country").add_attribute(Attribute::Bold),
        Cell::new("Temperature (°C)").add_attribute(Attribute::Bold),
        Cell::new("GDP growth (%)").add_attribute(Attribute::Bold),
        Cell::new("AQI").add_attribute(Attribute::Bold),
    ]);
    for (country, temperature, gdp_growth, aqi) in izip!(
        df_to_show.column(COL::COUNTRY)?.str()?,
        df_to_show.column(COL::TEMPERATURE)?.f64()?,
        df_to_show.column(COL::GDP_GROWTH)?.f64()?,
        df_to_show.column(COL::AQI)?.f64()?,
    ) {
        table.add_row(vec![
            country.unwrap_or_default().to_string(),
            temperature.map(|v| format!("{v:.1}")).unwrap_or_default(),
            gdp_growth.map(|v| format!("{v:.2}")).unwrap_or_default(),
            aqi.map(|v| format!("{v:.0}")).unwrap_or_default(),
        ]);
    }
    for idx in 1..4 {
        if let Some(column) = table.column_mut(idx) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    Ok(table)
}

pub fn display_metrics(metrics: &DataFrame, max_results: Option<usize>) -> anyhow::Result<()> {
    println!("\n{}", metrics_table(metrics, max_results)?);
    Ok(())
}

pub fn details_table(details: &CountryDetails) -> Table {
    let centroid = details
        .centroid
        .map(|(lat, lon)| format!("{lat:.4}, {lon:.4}"))
        .unwrap_or_else(|| "N/A".into());
    let mut table = styled_table();
    table
        .add_row(vec![
            Cell::new("Country").add_attribute(Attribute::Bold),
            details.country.clone().into(),
        ])
        .add_row(vec![
            Cell::new("ISO code").add_attribute(Attribute::Bold),
            details.iso_a3.clone().into(),
        ])
        .add_row(vec![
            Cell::new("Continent").add_attribute(Attribute::Bold),
            details.continent.clone().unwrap_or_default().into(),
        ])
        .add_row(vec![
            Cell::new("Centroid").add_attribute(Attribute::Bold),
            centroid.into(),
        ])
        .add_row(vec![
            Cell::new("GDP Growth").add_attribute(Attribute::Bold),
            Cell::new(details.gdp_growth()).add_attribute(Attribute::Bold),
        ])
        .add_row(vec![
            Cell::new("Inflation").add_attribute(Attribute::Bold),
            format!("{}%", format_decimal(details.economic.inflation)).into(),
        ])
        .add_row(vec![
            Cell::new("Unemployment").add_attribute(Attribute::Bold),
            format!("{}%", format_decimal(details.economic.unemployment)).into(),
        ])
        .add_row(vec![
            Cell::new("Stock index").add_attribute(Attribute::Bold),
            details.economic.stock_index.clone().into(),
        ])
        .add_row(vec![
            Cell::new("Temperature").add_attribute(Attribute::Bold),
            format!("{} °C", format_decimal(details.weather.temperature)).into(),
        ])
        .add_row(vec![
            Cell::new("Humidity").add_attribute(Attribute::Bold),
            format!("{}%", format_decimal(details.weather.humidity)).into(),
        ])
        .add_row(vec![
            Cell::new("Pressure").add_attribute(Attribute::Bold),
            format!("{} hPa", format_decimal(details.weather.pressure)).into(),
        ])
        .add_row(vec![
            Cell::new("Wind").add_attribute(Attribute::Bold),
            format!("{} m/s", format_decimal(details.weather.wind_speed)).into(),
        ])
        .add_row(vec![
            Cell::new("Conditions").add_attribute(Attribute::Bold),
            details.weather.description.clone().into(),
        ])
        .add_row(vec![
            Cell::new("Air quality index").add_attribute(Attribute::Bold),
            details.air_quality.aqi.to_string().into(),
        ])
        .add_row(vec![
            Cell::new("Dominant pollutant").add_attribute(Attribute::Bold),
            details.air_quality.dominant_pollutant.clone().into(),
        ]);

    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn display_details(details: &CountryDetails) {
    println!("\n{}", details_table(details));
}
