//! The canonical, serializable map document and its children.
//!
//! A [`MapData`] is replaced wholesale whenever any nested collection changes;
//! there is no patch protocol. Helpers here return updated copies.

use serde::{Deserialize, Serialize};

use crate::identifiers::*;
use crate::models::timeline::TimelineEvent;
use crate::models::types::*;

pub const DEFAULT_LAYER_COLOR: &str = "#3388ff";
pub const DEFAULT_ZOOM: u8 = 3;
pub const DEFAULT_FILL_OPACITY: f64 = 0.3;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const NEW_MARKER_TITLE: &str = "New Marker";
pub const NEW_MARKER_DESCRIPTION: &str = "Click to edit this marker";
pub const NEW_POLYGON_TITLE: &str = "New Polygon";
pub const NEW_POLYGON_DESCRIPTION: &str = "Click to edit this polygon";

fn default_fill_opacity() -> f64 {
    DEFAULT_FILL_OPACITY
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

// ============================================================================
// Children
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub color: String,
    /// Advisory only. Rendering follows the active layer set.
    #[serde(rename = "isVisible", default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            visible: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: MarkerId,
    pub layer_id: LayerId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stored as flat `lat`/`lng` keys
    #[serde(flatten)]
    pub position: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Marker {
    /// A freshly dropped marker with placeholder text
    pub fn new(id: MarkerId, layer_id: LayerId, position: LatLng) -> Self {
        Self {
            id,
            layer_id,
            title: NEW_MARKER_TITLE.to_owned(),
            description: Some(NEW_MARKER_DESCRIPTION.to_owned()),
            position,
            icon_color: None,
            link: None,
        }
    }

    pub fn with_icon_color(mut self, color: impl Into<String>) -> Self {
        self.icon_color = Some(color.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    pub id: PolygonId,
    pub layer_id: LayerId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coordinates: Vec<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
    /// Pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Polygon {
    pub const MIN_VERTICES: usize = 3;

    /// Build a polygon styled from its owning layer's color.
    ///
    /// Returns `Err` for rings with fewer than three vertices; vertex order is kept.
    pub fn new(
        id: PolygonId,
        layer_id: LayerId,
        coordinates: Vec<LatLng>,
        layer_color: &str,
    ) -> Result<Self> {
        validate_ring(&coordinates)?;

        Ok(Self {
            id,
            layer_id,
            title: NEW_POLYGON_TITLE.to_owned(),
            description: Some(NEW_POLYGON_DESCRIPTION.to_owned()),
            coordinates,
            fill_color: Some(layer_color.to_owned()),
            stroke_color: Some(layer_color.to_owned()),
            fill_opacity: DEFAULT_FILL_OPACITY,
            stroke_width: DEFAULT_STROKE_WIDTH,
            link: None,
        })
    }

    pub fn is_renderable(&self) -> bool {
        self.coordinates.len() >= Self::MIN_VERTICES
    }
}

/// Reject rings that cannot enclose an area
pub fn validate_ring(coordinates: &[LatLng]) -> Result<()> {
    if coordinates.len() < Polygon::MIN_VERTICES {
        return Err(ModelError::TooFewVertices(coordinates.len()));
    }
    Ok(())
}

/// A decoded image handed over by the upload collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// A single full-resolution image placed on the map.
///
/// `bounds` is derived from the map's center and zoom and the image size; it is
/// recomputed whenever any of those change rather than edited directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTileLayer {
    pub image_url: String,
    #[serde(rename = "imageBounds", with = "bounds_as_pairs")]
    pub bounds: GeoBounds,
    #[serde(rename = "imageWidth")]
    pub width: u32,
    #[serde(rename = "imageHeight")]
    pub height: u32,
}

impl CustomTileLayer {
    pub fn source(&self) -> ImageSource {
        ImageSource {
            data_url: self.image_url.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

// ============================================================================
// Map document
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "MapDocument", into = "MapDocument")]
pub struct MapData {
    pub id: MapId,
    pub name: String,
    pub center: LatLng,
    pub zoom: u8,
    pub layers: Vec<Layer>,
    pub markers: Vec<Marker>,
    pub polygons: Vec<Polygon>,
    pub timeline_events: Vec<TimelineEvent>,
    pub custom_tile_layer: Option<CustomTileLayer>,
    pub use_custom_tiles: bool,
}

/// Stored shape of [`MapData`]: the center is split into `centerLat`/`centerLng`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDocument {
    id: MapId,
    name: String,
    center_lat: f64,
    center_lng: f64,
    zoom: u8,
    #[serde(default)]
    layers: Vec<Layer>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(default)]
    polygons: Vec<Polygon>,
    #[serde(default)]
    timeline_events: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_tile_layer: Option<CustomTileLayer>,
    #[serde(default)]
    use_custom_tile_layer: bool,
}

impl From<MapDocument> for MapData {
    fn from(doc: MapDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            center: LatLng::new(doc.center_lat, doc.center_lng),
            zoom: doc.zoom,
            layers: doc.layers,
            markers: doc.markers,
            polygons: doc.polygons,
            timeline_events: doc.timeline_events,
            custom_tile_layer: doc.custom_tile_layer,
            use_custom_tiles: doc.use_custom_tile_layer,
        }
    }
}

impl From<MapData> for MapDocument {
    fn from(map: MapData) -> Self {
        Self {
            id: map.id,
            name: map.name,
            center_lat: map.center.lat,
            center_lng: map.center.lng,
            zoom: map.zoom,
            layers: map.layers,
            markers: map.markers,
            polygons: map.polygons,
            timeline_events: map.timeline_events,
            custom_tile_layer: map.custom_tile_layer,
            use_custom_tile_layer: map.use_custom_tiles,
        }
    }
}

impl MapData {
    pub fn new(
        name: impl Into<String>,
        custom_tile_layer: Option<CustomTileLayer>,
        ids: &mut IdGenerator,
    ) -> Self {
        Self {
            id: MapId::generate(ids),
            name: name.into(),
            center: LatLng::new(0.0, 0.0),
            zoom: DEFAULT_ZOOM,
            layers: Vec::new(),
            markers: Vec::new(),
            polygons: Vec::new(),
            timeline_events: Vec::new(),
            use_custom_tiles: custom_tile_layer.is_some(),
            custom_tile_layer,
        }
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    pub fn timeline_event(&self, id: &TimelineEventId) -> Option<&TimelineEvent> {
        self.timeline_events.iter().find(|e| &e.id == id)
    }

    pub fn with_markers(&self, markers: Vec<Marker>) -> Self {
        Self {
            markers,
            ..self.clone()
        }
    }

    pub fn with_polygons(&self, polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            ..self.clone()
        }
    }

    pub fn with_layers(&self, layers: Vec<Layer>) -> Self {
        Self {
            layers,
            ..self.clone()
        }
    }

    /// Remove a layer and everything that refers to it.
    ///
    /// This is the referential-integrity path for editors. Rendering tolerates
    /// dangling layer ids on its own, so nothing in the engine calls this.
    pub fn remove_layer_cascading(&self, layer_id: &LayerId) -> Result<Self> {
        if self.layer(layer_id).is_none() {
            return Err(ModelError::LayerNotFound(layer_id.clone()));
        }

        let mut next = self.clone();
        next.layers.retain(|l| &l.id != layer_id);
        next.markers.retain(|m| &m.layer_id != layer_id);
        next.polygons.retain(|p| &p.layer_id != layer_id);
        for event in &mut next.timeline_events {
            event.layer_ids.retain(|id| id != layer_id);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(i as f64, (i * 2) as f64)).collect()
    }

    #[test]
    fn test_polygon_rejects_two_point_ring() {
        let err = Polygon::new(PolygonId::new("p"), LayerId::new("l"), ring(2), "#ff0000");
        assert!(matches!(err, Err(ModelError::TooFewVertices(2))));
        assert!(validate_ring(&[]).is_err());
    }

    #[test]
    fn test_polygon_keeps_input_order() {
        for n in 3..8 {
            let coords = ring(n);
            let polygon =
                Polygon::new(PolygonId::new("p"), LayerId::new("l"), coords.clone(), "#ff0000")
                    .unwrap();
            assert_eq!(polygon.coordinates, coords);
            assert_eq!(polygon.stroke_color.as_deref(), Some("#ff0000"));
            assert_eq!(polygon.fill_color.as_deref(), Some("#ff0000"));
            assert!(polygon.is_renderable());
        }
    }

    #[test]
    fn test_factory_sets_custom_flag() {
        let mut ids = IdGenerator::new();
        let plain = MapData::new("Plain", None, &mut ids);
        assert!(!plain.use_custom_tiles);
        assert_eq!(plain.zoom, DEFAULT_ZOOM);

        let custom = CustomTileLayer {
            image_url: "data:image/png;base64,AAAA".into(),
            bounds: GeoBounds::new(LatLng::new(-1.0, -1.0), LatLng::new(1.0, 1.0)),
            width: 10,
            height: 10,
        };
        let fancy = MapData::new("Fancy", Some(custom), &mut ids);
        assert!(fancy.use_custom_tiles);
        assert_ne!(plain.id, fancy.id);
    }

    #[test]
    fn test_serialized_field_names() {
        let marker = Marker::new(
            MarkerId::new("m1"),
            LayerId::new("l1"),
            LatLng::new(1.0, 2.0),
        );
        let value = serde_json::to_value(&marker).unwrap();
        assert_eq!(value["layerId"], "l1");
        assert_eq!(value["lat"], 1.0);
        assert_eq!(value["lng"], 2.0);
        assert!(value.get("position").is_none());
        assert!(value.get("iconColor").is_none());
        assert_eq!(value["description"], NEW_MARKER_DESCRIPTION);
    }

    const EDITOR_DOCUMENT: &str = r##"[
      {
        "id": "map-1700000000000",
        "name": "Fantasy World",
        "centerLat": 10.5,
        "centerLng": -20,
        "zoom": 3,
        "layers": [
          { "id": "layer-1", "name": "Kingdoms", "color": "#ff0000", "isVisible": true },
          { "id": "layer-2", "name": "Routes", "color": "#0000ff" }
        ],
        "markers": [
          {
            "id": "marker-1", "layerId": "layer-1", "title": "Eldoria",
            "description": "", "lat": 10, "lng": 5, "iconColor": "#ff0000"
          }
        ],
        "polygons": [
          {
            "id": "polygon-1", "layerId": "layer-1", "title": "Territory",
            "coordinates": [
              { "lat": 8, "lng": 3 }, { "lat": 12, "lng": 3 }, { "lat": 12, "lng": 7 }
            ],
            "fillColor": "#ff0000"
          }
        ],
        "timelineEvents": [
          { "id": "event-1", "name": "Founding", "year": "1000 BE", "layerIds": ["layer-1"] }
        ],
        "customTileLayer": {
          "imageUrl": "data:image/png;base64,AAAA",
          "imageBounds": [[-1.6, -3.2], [1.6, 3.2]],
          "imageWidth": 640,
          "imageHeight": 320
        },
        "useCustomTileLayer": true
      },
      {
        "id": "map-2", "name": "Blank", "centerLat": 0, "centerLng": 0, "zoom": 3,
        "layers": [], "markers": [], "polygons": [], "timelineEvents": [],
        "customTileLayer": null, "useCustomTileLayer": false
      }
    ]"##;

    #[test]
    fn test_reads_editor_document() {
        let maps: Vec<MapData> = serde_json::from_str(EDITOR_DOCUMENT).unwrap();
        assert_eq!(maps.len(), 2);

        let map = &maps[0];
        assert_eq!(map.center, LatLng::new(10.5, -20.0));
        assert!(map.use_custom_tiles);
        assert_eq!(map.layers[0].visible, Some(true));
        assert_eq!(map.layers[1].visible, None);
        assert_eq!(map.markers[0].position, LatLng::new(10.0, 5.0));
        assert_eq!(map.markers[0].icon_color.as_deref(), Some("#ff0000"));

        let polygon = &map.polygons[0];
        assert_eq!(polygon.stroke_color, None);
        assert_eq!(polygon.fill_opacity, DEFAULT_FILL_OPACITY);
        assert_eq!(polygon.stroke_width, DEFAULT_STROKE_WIDTH);

        let custom = map.custom_tile_layer.as_ref().unwrap();
        assert_eq!(
            custom.bounds,
            GeoBounds::new(LatLng::new(-1.6, -3.2), LatLng::new(1.6, 3.2))
        );
        assert_eq!((custom.width, custom.height), (640, 320));

        assert!(maps[1].custom_tile_layer.is_none());
        assert!(!maps[1].use_custom_tiles);
    }

    #[test]
    fn test_writes_editor_document() {
        let maps: Vec<MapData> = serde_json::from_str(EDITOR_DOCUMENT).unwrap();
        let value = serde_json::to_value(&maps[0]).unwrap();

        assert_eq!(value["centerLat"], 10.5);
        assert_eq!(value["centerLng"], -20.0);
        assert!(value.get("center").is_none());
        assert_eq!(value["useCustomTileLayer"], true);
        assert_eq!(value["layers"][0]["isVisible"], true);
        assert_eq!(value["markers"][0]["lat"], 10.0);
        assert_eq!(value["polygons"][0]["strokeWidth"], 2.0);
        assert_eq!(
            value["customTileLayer"]["imageBounds"],
            serde_json::json!([[-1.6, -3.2], [1.6, 3.2]])
        );
        assert_eq!(value["customTileLayer"]["imageWidth"], 640);

        let again: Vec<MapData> =
            serde_json::from_value(serde_json::Value::Array(vec![value])).unwrap();
        assert_eq!(again[0], maps[0]);
    }

    #[test]
    fn test_rejects_malformed_image_bounds() {
        let json = r#"{"imageUrl":"x","imageBounds":[[0,0]],"imageWidth":1,"imageHeight":1}"#;
        assert!(serde_json::from_str::<CustomTileLayer>(json).is_err());
    }

    #[test]
    fn test_new_item_defaults() {
        let marker = Marker::new(MarkerId::new("m"), LayerId::new("l"), LatLng::default())
            .with_icon_color("#123456");
        assert_eq!(marker.icon_color.as_deref(), Some("#123456"));

        let polygon = Polygon::new(PolygonId::new("p"), LayerId::new("l"), ring(3), "#00ff00").unwrap();
        assert_eq!(polygon.description.as_deref(), Some(NEW_POLYGON_DESCRIPTION));
        assert_eq!(polygon.fill_opacity, 0.3);
        assert_eq!(polygon.stroke_width, 2.0);
        assert_eq!(MapData::new("m", None, &mut IdGenerator::new()).zoom, 3);
    }

    #[test]
    fn test_cascading_layer_removal() {
        let mut ids = IdGenerator::new();
        let mut map = MapData::new("Cascade", None, &mut ids);
        map.layers = vec![
            Layer::new(LayerId::new("a"), "A", "#ff0000"),
            Layer::new(LayerId::new("b"), "B", "#00ff00"),
        ];
        map.markers = vec![
            Marker::new(MarkerId::new("m1"), LayerId::new("a"), LatLng::default()),
            Marker::new(MarkerId::new("m2"), LayerId::new("b"), LatLng::default()),
        ];
        map.timeline_events = vec![TimelineEvent::new(
            TimelineEventId::new("e"),
            "Event",
            [LayerId::new("a"), LayerId::new("b")],
        )];

        let next = map.remove_layer_cascading(&LayerId::new("a")).unwrap();
        assert_eq!(next.layers.len(), 1);
        assert_eq!(next.markers.len(), 1);
        assert_eq!(next.markers[0].id, MarkerId::new("m2"));
        assert!(!next.timeline_events[0].layer_ids.contains(&LayerId::new("a")));

        assert!(map.remove_layer_cascading(&LayerId::new("zzz")).is_err());
    }
}
