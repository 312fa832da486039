//! # chronoatlas-model
//!
//! Canonical, serializable data for layered world maps.
//!
//! ## Features
//!
//! - **Plain data**: maps, layers, markers, polygons and timeline events serialize
//!   to the same camelCase JSON the editor persists
//! - **Timestamp identifiers**: cheap-to-clone typed ids minted from creation time
//! - **Timeline ordering**: best-effort numeric sorting of free-text years
//! - **Whole-value persistence**: a key-value [`store::MapStore`] boundary
//!
//! ## Example
//!
//! ```
//! use chronoatlas_model::prelude::*;
//!
//! let mut ids = IdGenerator::new();
//! let mut map = MapData::new("The Known World", None, &mut ids);
//! let layer = Layer::new(LayerId::generate(&mut ids), "Cities", "#ff0000");
//! map.layers.push(layer.clone());
//!
//! let marker = Marker::new(MarkerId::generate(&mut ids), layer.id.clone(), LatLng::new(12.0, 34.0));
//! let map = map.with_markers(vec![marker]);
//! assert_eq!(map.markers.len(), 1);
//!
//! // Fewer than three vertices never make a polygon
//! let too_small = vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)];
//! assert!(Polygon::new(PolygonId::generate(&mut ids), layer.id, too_small, "#ff0000").is_err());
//! ```

pub mod identifiers;
pub mod models;
pub mod store;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{map::*, timeline::*, types::*};
    pub use crate::store::{JsonDirStore, MapCollection, MapStore, MemoryStore, DEFAULT_STORE_KEY};
}

pub use prelude::*;
