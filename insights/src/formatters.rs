use std::io::Write;

use anyhow::Result;
use enum_dispatch::enum_dispatch;
use geojson::{FeatureCollection, JsonObject};
use serde::{Deserialize, Serialize};

use crate::choropleth::Choropleth;

/// Trait to define different output generators for a rendered choropleth. `save` writes the
/// serialized map to a writer and `format` collects the same output into a string.
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, map: &Choropleth) -> Result<()>;
    fn format(&self, map: &Choropleth) -> Result<String> {
        let mut data: Vec<u8> = vec![];
        self.save(&mut data, map)?;
        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    GeoJSONSeq(GeoJSONSeqFormatter),
    Html(HtmlFormatter),
}

fn feature_collection(map: &Choropleth) -> Result<FeatureCollection> {
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("name".into(), map.category.to_string().into());
    foreign_members.insert("legend".into(), serde_json::to_value(&map.legend)?);
    Ok(FeatureCollection {
        bbox: None,
        features: map.features.clone(),
        foreign_members: Some(foreign_members),
    })
}

/// Format the map as a single geojson FeatureCollection. The legend is
/// carried as a foreign member.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter;

impl OutputGenerator for GeoJSONFormatter {
    fn save(&self, writer: &mut impl Write, map: &Choropleth) -> Result<()> {
        let collection = feature_collection(map)?;
        writer.write_all(collection.to_string().as_bytes())?;
        Ok(())
    }
}

/// Format the map as geojson sequence format
/// This is one line per feature serialized as a
/// geojson feature
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONSeqFormatter;

impl OutputGenerator for GeoJSONSeqFormatter {
    fn save(&self, writer: &mut impl Write, map: &Choropleth) -> Result<()> {
        for feature in &map.features {
            writeln!(writer, "{feature}")?;
        }
        Ok(())
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.legend { background: white; padding: 6px 8px; line-height: 18px; }
.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.7; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const data = __GEOJSON__;
const map = L.map('map').setView([0, 0], 2);
L.tileLayer('https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png', {
  attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
}).addTo(map);
L.geoJSON(data, {
  style: f => ({
    fillColor: f.properties.fill || '#000000',
    fillOpacity: f.properties['fill-opacity'],
    color: f.properties.stroke,
    opacity: f.properties['stroke-opacity'],
    weight: f.properties['stroke-width']
  }),
  onEachFeature: (f, layer) => layer.bindTooltip(f.properties.tooltip)
}).addTo(map);
const legend = L.control({ position: 'topright' });
legend.onAdd = () => {
  const div = L.DomUtil.create('div', 'legend');
  div.innerHTML = '<b>' + data.legend.title + '</b><br>' + data.legend.bins
    .map(b => '<i style="background:' + b.color + '"></i>' + b.lower.toFixed(1) + ' &ndash; ' + b.upper.toFixed(1))
    .join('<br>');
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;

/// Format the map as a standalone Leaflet page on CartoDB positron tiles
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct HtmlFormatter;

impl OutputGenerator for HtmlFormatter {
    fn save(&self, writer: &mut impl Write, map: &Choropleth) -> Result<()> {
        // "</" inside an inline script would close the tag early
        let geojson = feature_collection(map)?.to_string().replace("</", "<\\/");
        let page = HTML_TEMPLATE
            .replace("__TITLE__", &map.legend.title)
            .replace("__GEOJSON__", &geojson);
        writer.write_all(page.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choropleth::{render_choropleth, Category};
    use crate::geo::tests::test_boundaries;
    use crate::metrics::{build_global_table, RandomMetrics};
    use geojson::{Feature, GeoJson};

    fn test_map() -> Choropleth {
        let boundaries = test_boundaries();
        let table = build_global_table(&RandomMetrics::new(Some(1)), &boundaries).unwrap();
        render_choropleth(&boundaries, &table, Category::Weather).unwrap()
    }

    #[test]
    fn geojson_output_should_round_trip() {
        let output = GeoJSONFormatter.format(&test_map()).unwrap();
        let parsed: GeoJson = output.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = parsed else {
            panic!("expected a FeatureCollection");
        };
        assert_eq!(collection.features.len(), 9);
        let legend = &collection.foreign_members.unwrap()["legend"];
        assert_eq!(legend["title"], "Weather Data");
        assert_eq!(legend["bins"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn geojson_seq_should_write_one_feature_per_line() {
        let output = GeoJSONSeqFormatter.format(&test_map()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 9);
        for line in lines {
            let feature: Feature = line.parse::<GeoJson>().unwrap().try_into().unwrap();
            assert!(feature.contains_property("tooltip"));
        }
    }

    #[test]
    fn html_should_embed_the_map() {
        let formatter: OutputFormatter = HtmlFormatter.into();
        let output = formatter.format(&test_map()).unwrap();
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("<title>Weather Data</title>"));
        assert!(output.contains("Country: Kenya"));
        assert!(!output.contains("__GEOJSON__"));
    }
}
