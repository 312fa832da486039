//! Geographic primitives and errors shared by the map model.

use geo::{Coord, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::identifiers::*;

// ============================================================================
// Coordinates
// ============================================================================

/// A geographic position in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<LatLng> for Coord {
    fn from(p: LatLng) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

impl From<Coord> for LatLng {
    fn from(c: Coord) -> Self {
        Self::new(c.y, c.x)
    }
}

impl From<LatLng> for Point {
    fn from(p: LatLng) -> Self {
        Point::new(p.lng, p.lat)
    }
}

impl From<Point> for LatLng {
    fn from(p: Point) -> Self {
        Self::new(p.y(), p.x())
    }
}

/// Axis-aligned geographic box given by its south-west and north-east corners
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Longitude span in degrees
    pub fn width(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }

    /// Latitude span in degrees
    pub fn height(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(Coord::from(self.south_west), Coord::from(self.north_east))
    }
}

/// (De)serialize [`GeoBounds`] as `[[south, west], [north, east]]` lat/lng pairs
pub(crate) mod bounds_as_pairs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{GeoBounds, LatLng};

    pub fn serialize<S: Serializer>(bounds: &GeoBounds, serializer: S) -> Result<S::Ok, S::Error> {
        let (sw, ne) = (bounds.south_west, bounds.north_east);
        [[sw.lat, sw.lng], [ne.lat, ne.lng]].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GeoBounds, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        match pairs.as_slice() {
            [[s, w], [n, e]] => Ok(GeoBounds::new(LatLng::new(*s, *w), LatLng::new(*n, *e))),
            _ => Err(D::Error::invalid_length(pairs.len(), &"two [lat, lng] pairs")),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Map not found: {0}")]
    MapNotFound(MapId),

    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
