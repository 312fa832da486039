//! # chronoatlas-core
//!
//! Keeps an imperative map surface in sync with declarative map data.
//!
//! The host owns a [`MapData`](chronoatlas_model::MapData) and passes it down
//! as [`MapProps`](lifecycle::MapProps). The [`MapController`](lifecycle::MapController)
//! creates the surface, picks the basemap, renders the markers and polygons of
//! the layers active for the selected timeline event, and turns clicks and
//! drawn shapes into new data reported back through
//! [`MapCallbacks`](lifecycle::MapCallbacks).
//!
//! Rendering is a full rebuild on every content change. Nothing on the surface
//! is patched in place except a freshly drawn polygon.

pub mod authoring;
pub mod config;
pub mod layers;
pub mod lifecycle;
pub mod map;
pub mod reconcile;
pub mod render;
pub mod surface;
pub mod timeline;

pub mod prelude {
    pub use chronoatlas_model::prelude::*;

    pub use crate::authoring::draw::{DrawnShape, DrawnVertices, ShapeKind};
    pub use crate::authoring::{Authoring, AuthoringError, AuthoringMode};
    pub use crate::config::{CustomImageConfig, EngineConfig, TileConfig};
    pub use crate::lifecycle::{
        BasemapTicket, DiscardUpdates, MapCallbacks, MapController, MapProps, Phase,
    };
    pub use crate::map::basemap::{BasemapError, DataUrlImageLoader, ImageLoader, LoadedImage};
    pub use crate::map::georef::{GeorefConfig, GeorefError, image_bounds};
    pub use crate::reconcile::ReconcileReport;
    pub use crate::surface::headless::{HeadlessFactory, HeadlessSurface, RenderedScene};
    pub use crate::surface::{MapSurface, SurfaceFactory};
    pub use crate::timeline::{ActiveLayers, resolve_active_layers};
}
