//! Choosing and attaching the single basemap.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chronoatlas_model::{GeoBounds, ImageSource, LatLng, MapData};
use futures_util::future::{self, LocalBoxFuture};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::map::georef::GeorefError;
use crate::surface::{Basemap, BasemapHandle, MapSurface, TileLayerSpec};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BasemapError {
    #[error("not an image data URL")]
    NotAnImage,

    #[error("image data could not be decoded: {0}")]
    Decode(String),

    #[error("image failed to load: {0}")]
    Load(String),

    #[error(transparent)]
    Georef(#[from] GeorefError),
}

/// An image ready to be placed on the map
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Loads and decodes basemap images. This is the engine's only async step.
pub trait ImageLoader {
    fn load<'a>(&'a self, source: &'a ImageSource)
        -> LocalBoxFuture<'a, Result<LoadedImage, BasemapError>>;
}

/// Accepts `data:image/*;base64,` URLs and checks that the payload decodes
#[derive(Clone, Copy, Debug, Default)]
pub struct DataUrlImageLoader;

impl DataUrlImageLoader {
    fn decode(source: &ImageSource) -> Result<LoadedImage, BasemapError> {
        let rest = source
            .data_url
            .strip_prefix("data:image/")
            .ok_or(BasemapError::NotAnImage)?;
        let (header, payload) = rest.split_once(',').ok_or(BasemapError::NotAnImage)?;
        if !header.ends_with(";base64") {
            return Err(BasemapError::Decode("expected base64 encoding".to_owned()));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| BasemapError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Err(BasemapError::Decode("empty image".to_owned()));
        }

        Ok(LoadedImage {
            url: source.data_url.clone(),
            width: source.width,
            height: source.height,
        })
    }
}

impl ImageLoader for DataUrlImageLoader {
    fn load<'a>(
        &'a self,
        source: &'a ImageSource,
    ) -> LocalBoxFuture<'a, Result<LoadedImage, BasemapError>> {
        Box::pin(future::ready(Self::decode(source)))
    }
}

/// What the map's data asks for
#[derive(Clone, Debug, PartialEq)]
pub enum BasemapPlan {
    Tiles,
    CustomImage(ImageSource),
    /// Custom basemap selected but no image stored
    MissingImage,
}

impl BasemapPlan {
    pub fn for_map(map: &MapData) -> Self {
        match (map.use_custom_tiles, &map.custom_tile_layer) {
            (false, _) => BasemapPlan::Tiles,
            (true, Some(layer)) => BasemapPlan::CustomImage(layer.source()),
            (true, None) => BasemapPlan::MissingImage,
        }
    }
}

/// Holds the one basemap currently on the surface
#[derive(Debug, Default)]
pub struct BasemapSelector {
    current: Option<BasemapHandle>,
    image_bounds: Option<GeoBounds>,
}

impl BasemapSelector {
    pub fn current(&self) -> Option<BasemapHandle> {
        self.current
    }

    /// Bounds of the attached image overlay, if the basemap is an image
    pub fn image_bounds(&self) -> Option<GeoBounds> {
        self.image_bounds
    }

    /// Remove whatever basemap is attached
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(handle) = self.current.take() {
            surface.remove_basemap(handle);
        }
        self.image_bounds = None;
    }

    /// Restrict the viewport for the given plan
    pub fn apply_view_limits<S: MapSurface + ?Sized>(
        surface: &mut S,
        plan: &BasemapPlan,
        config: &EngineConfig,
    ) {
        match plan {
            BasemapPlan::Tiles => {
                surface.set_zoom_limits(config.tiles.min_zoom, config.tiles.max_zoom);
                surface.set_world_wrap(true);
            }
            BasemapPlan::CustomImage(_) | BasemapPlan::MissingImage => {
                surface.set_zoom_limits(config.custom_image.min_zoom, config.custom_image.max_zoom);
                surface.set_world_wrap(false);
            }
        }
    }

    pub fn attach_tiles<S: MapSurface + ?Sized>(&mut self, surface: &mut S, config: &EngineConfig) {
        self.clear(surface);
        let spec = TileLayerSpec {
            url_template: config.tiles.url_template.clone(),
            attribution: config.tiles.attribution.clone(),
            min_zoom: config.tiles.min_zoom,
            max_zoom: config.tiles.max_zoom,
        };
        self.current = Some(surface.add_basemap(Basemap::Tiles(spec)));
        debug!("attached tile basemap");
    }

    /// Georeference the image at the current view, attach it, and fit to it.
    ///
    /// On error the previous basemap is still removed and nothing replaces it.
    pub fn attach_image<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        image: &LoadedImage,
        center: LatLng,
        zoom: u8,
        config: &EngineConfig,
    ) -> Result<GeoBounds, BasemapError> {
        self.clear(surface);
        let bounds = config.georef.bounds(center, zoom, image.width, image.height)?;

        self.current = Some(surface.add_basemap(Basemap::Image {
            url: image.url.clone(),
            bounds,
        }));
        self.image_bounds = Some(bounds);
        surface.fit_bounds(bounds);
        info!(
            width = image.width,
            height = image.height,
            south = bounds.south_west.lat,
            west = bounds.south_west.lng,
            north = bounds.north_east.lat,
            east = bounds.north_east.lng,
            "attached image basemap"
        );
        Ok(bounds)
    }
}
