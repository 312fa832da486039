//! The imperative rendering surface the engine drives.
//!
//! Implementations wrap a real map widget; [`headless::HeadlessSurface`] keeps
//! everything in memory. Handles are plain indices into the surface's own
//! arenas, so the engine never holds references into the surface.

pub mod headless;

use chronoatlas_model::{GeoBounds, LatLng};

use crate::render::Primitive;

macro_rules! impl_handle {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(index: u64) -> Self {
                Self(index)
            }

            pub const fn index(&self) -> u64 {
                self.0
            }
        }
    };
}

impl_handle!(BasemapHandle);
impl_handle!(GroupHandle);
impl_handle!(PrimitiveHandle);
impl_handle!(ListenerHandle);

/// A remote raster tile service
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayerSpec {
    pub url_template: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// The bottom-most visual layer
#[derive(Clone, Debug, PartialEq)]
pub enum Basemap {
    Tiles(TileLayerSpec),
    Image { url: String, bounds: GeoBounds },
}

/// Surface events the engine subscribes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum SurfaceEvent {
    Click,
    ShapeCreated,
}

/// What the draw control should show, pushed by the engine on every change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawToolState {
    pub visible: bool,
    /// Group that receives finished shapes
    pub target: Option<GroupHandle>,
}

/// Initial view for a new surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceOptions {
    pub center: LatLng,
    pub zoom: u8,
}

pub trait MapSurface {
    fn set_view(&mut self, center: LatLng, zoom: u8);
    fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8);
    fn set_world_wrap(&mut self, enabled: bool);
    fn fit_bounds(&mut self, bounds: GeoBounds);

    fn add_basemap(&mut self, basemap: Basemap) -> BasemapHandle;
    fn remove_basemap(&mut self, handle: BasemapHandle);

    /// Create an empty, detached group
    fn create_group(&mut self) -> GroupHandle;
    fn attach_group(&mut self, group: GroupHandle);
    fn detach_group(&mut self, group: GroupHandle);
    /// Drop every primitive in the group, leaving the group itself in place
    fn clear_group(&mut self, group: GroupHandle);
    fn destroy_group(&mut self, group: GroupHandle);
    fn add_primitive(&mut self, group: GroupHandle, primitive: Primitive) -> PrimitiveHandle;

    fn set_draw_tool(&mut self, state: DrawToolState);

    fn listen(&mut self, event: SurfaceEvent) -> ListenerHandle;
    fn unlisten(&mut self, listener: ListenerHandle);

    /// Release the underlying widget. The surface is unusable afterwards.
    fn dispose(&mut self);
}

pub trait SurfaceFactory {
    type Surface: MapSurface;

    fn create(&mut self, options: SurfaceOptions) -> Self::Surface;
}
