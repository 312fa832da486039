//! Render primitives built from canonical map data.

pub mod popup;
pub mod style;

use chronoatlas_model::{LatLng, Layer, LayerId, Marker, MarkerId, Polygon, PolygonId};

use crate::render::{
    popup::Popup,
    style::{MarkerIcon, PathStyle, first_color},
};

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPrimitive {
    pub source: MarkerId,
    pub layer: LayerId,
    pub position: LatLng,
    pub icon: MarkerIcon,
    pub popup: Popup,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolygonPrimitive {
    pub source: PolygonId,
    pub layer: LayerId,
    pub ring: Vec<LatLng>,
    pub style: PathStyle,
    pub popup: Popup,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Marker(MarkerPrimitive),
    Polygon(PolygonPrimitive),
}

impl Primitive {
    pub fn layer(&self) -> &LayerId {
        match self {
            Primitive::Marker(m) => &m.layer,
            Primitive::Polygon(p) => &p.layer,
        }
    }
}

/// Icon color is the marker's own, falling back to its layer's
pub fn marker_primitive(marker: &Marker, layer: &Layer) -> MarkerPrimitive {
    MarkerPrimitive {
        source: marker.id.clone(),
        layer: layer.id.clone(),
        position: marker.position,
        icon: MarkerIcon {
            color: first_color([marker.icon_color.as_deref(), Some(layer.color.as_str())]),
        },
        popup: Popup::new(
            &marker.title,
            marker.description.as_deref(),
            marker.link.as_deref(),
        ),
    }
}

/// `None` for rings that cannot be drawn (fewer than three vertices)
pub fn polygon_primitive(polygon: &Polygon, layer: &Layer) -> Option<PolygonPrimitive> {
    if !polygon.is_renderable() {
        return None;
    }

    let fill = first_color([polygon.fill_color.as_deref(), Some(layer.color.as_str())]);
    let stroke = first_color([polygon.stroke_color.as_deref(), Some(layer.color.as_str())]);

    Some(PolygonPrimitive {
        source: polygon.id.clone(),
        layer: layer.id.clone(),
        ring: polygon.coordinates.clone(),
        style: PathStyle::solid_color(fill, polygon.fill_opacity as f32)
            .with_border(polygon.stroke_width as f32, stroke),
        popup: Popup::new(
            &polygon.title,
            polygon.description.as_deref(),
            polygon.link.as_deref(),
        ),
    })
}
