//! Map data models, geographic types, and timeline ordering.

pub mod map;
pub mod timeline;
pub mod types;

// Re-exports for convenience
pub use map::{
    validate_ring, CustomTileLayer, ImageSource, Layer, MapData, Marker, Polygon,
    DEFAULT_LAYER_COLOR,
};
pub use timeline::{parse_year, sort_timeline, TimelineEvent};
pub use types::{GeoBounds, LatLng, ModelError, Result};
