//! Shapes reported by the draw tool.
//!
//! Draw backends disagree on the vertex layout: some report a flat list,
//! others a ring-of-rings. Everything is flattened to one ordered ring here.

use chronoatlas_model::LatLng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Other(String),
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "polygon" => ShapeKind::Polygon,
            "rectangle" => ShapeKind::Rectangle,
            _ => ShapeKind::Other(tag.to_owned()),
        }
    }

    pub fn is_area(&self) -> bool {
        matches!(self, ShapeKind::Polygon | ShapeKind::Rectangle)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawnVertices {
    Flat(Vec<LatLng>),
    Nested(Vec<Vec<LatLng>>),
}

/// Payload of the draw tool's "created" event
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnShape {
    pub kind: ShapeKind,
    pub vertices: DrawnVertices,
}

impl DrawnShape {
    pub fn polygon(vertices: Vec<LatLng>) -> Self {
        Self {
            kind: ShapeKind::Polygon,
            vertices: DrawnVertices::Flat(vertices),
        }
    }

    /// Read a GeoJSON geometry (positions are `[lng, lat]`)
    pub fn from_geojson(geometry: &geojson::Geometry) -> Self {
        let to_latlng = |position: &Vec<f64>| match position.as_slice() {
            [lng, lat, ..] => LatLng::new(*lat, *lng),
            // Malformed positions are dropped by `ring`
            _ => LatLng::new(f64::NAN, f64::NAN),
        };

        match &geometry.value {
            geojson::Value::Polygon(rings) => Self {
                kind: ShapeKind::Polygon,
                vertices: DrawnVertices::Nested(
                    rings
                        .iter()
                        .map(|ring| ring.iter().map(to_latlng).collect())
                        .collect(),
                ),
            },
            geojson::Value::LineString(line) => Self {
                kind: ShapeKind::Other("LineString".to_owned()),
                vertices: DrawnVertices::Flat(line.iter().map(to_latlng).collect()),
            },
            geojson::Value::Point(point) => Self {
                kind: ShapeKind::Other("Point".to_owned()),
                vertices: DrawnVertices::Flat(vec![to_latlng(point)]),
            },
            _ => Self {
                kind: ShapeKind::Other("Unsupported".to_owned()),
                vertices: DrawnVertices::Flat(Vec::new()),
            },
        }
    }

    /// The outer ring as one flat, ordered list of finite vertices.
    ///
    /// A trailing vertex equal to the first (GeoJSON ring closure) is dropped.
    pub fn ring(&self) -> Vec<LatLng> {
        let raw: &[LatLng] = match &self.vertices {
            DrawnVertices::Flat(points) => points,
            DrawnVertices::Nested(rings) => rings
                .iter()
                .find(|ring| !ring.is_empty())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        };

        let mut ring: Vec<LatLng> = raw.iter().copied().filter(LatLng::is_finite).collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    #[test]
    fn test_nested_ring_flattened() {
        let shape = DrawnShape {
            kind: ShapeKind::Polygon,
            vertices: DrawnVertices::Nested(vec![
                vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0)],
                vec![LatLng::new(0.2, 0.2)],
            ]),
        };
        assert_eq!(
            shape.ring(),
            vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0)]
        );
    }

    #[test]
    fn test_geojson_polygon_closure_dropped() {
        let geometry = Geometry::new(Value::Polygon(vec![vec![
            vec![10.0, 50.0],
            vec![11.0, 50.0],
            vec![11.0, 51.0],
            vec![10.0, 50.0],
        ]]));
        let shape = DrawnShape::from_geojson(&geometry);

        assert_eq!(shape.kind, ShapeKind::Polygon);
        assert_eq!(
            shape.ring(),
            vec![LatLng::new(50.0, 10.0), LatLng::new(50.0, 11.0), LatLng::new(51.0, 11.0)]
        );
    }

    #[test]
    fn test_invalid_vertices_filtered() {
        let shape = DrawnShape::polygon(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(f64::NAN, 1.0),
            LatLng::new(1.0, 1.0),
        ]);
        assert_eq!(shape.ring().len(), 2);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ShapeKind::from_tag("Rectangle"), ShapeKind::Rectangle);
        assert!(ShapeKind::from_tag("polygon").is_area());
        assert!(!ShapeKind::from_tag("polyline").is_area());
    }
}
