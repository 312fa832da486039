use anyhow::{Context, Result};
use chronoatlas_core::surface::Basemap;
use chronoatlas_model::GeoBounds;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::path::Path;

use crate::render::RenderOutcome;

/// Outline of an image basemap as an unfilled rectangle
fn basemap_feature(bounds: &GeoBounds) -> Feature {
    let (sw, ne) = (bounds.south_west, bounds.north_east);
    let ring = vec![
        vec![sw.lng, sw.lat],
        vec![ne.lng, sw.lat],
        vec![ne.lng, ne.lat],
        vec![sw.lng, ne.lat],
        vec![sw.lng, sw.lat],
    ];

    let mut properties = serde_json::Map::new();
    properties.insert("kind".to_string(), serde_json::json!("basemap"));
    properties.insert("fill-opacity".to_string(), serde_json::json!(0.0));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// The rendered scene, preceded by the image basemap outline if there is one
pub fn scene_collection(outcome: &RenderOutcome) -> FeatureCollection {
    let mut collection = outcome.scene.to_geojson();
    if let Some(Basemap::Image { bounds, .. }) = &outcome.basemap {
        collection.features.insert(0, basemap_feature(bounds));
    }
    collection
}

/// Write a rendered map to a GeoJSON file
pub fn write_scene_geojson(outcome: &RenderOutcome, output_path: &Path) -> Result<()> {
    let feature_collection = scene_collection(outcome);
    log::info!(
        "Writing {} features to {}",
        feature_collection.features.len(),
        output_path.display()
    );

    let geojson = GeoJson::from(feature_collection);
    let json_string = serde_json::to_string_pretty(&geojson)
        .context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}
