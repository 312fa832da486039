use chronoatlas_model::{CustomTileLayer, GeoBounds, ImageSource, LatLng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeorefError {
    #[error("zoom {zoom} outside supported range [{min}, {max}]")]
    ZoomOutOfRange { zoom: u8, min: u8, max: u8 },

    #[error("image dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Constants for placing a raster image on the geographic plane.
///
/// At `pivot_zoom` the longer image side spans `base_size` degrees; every zoom
/// level above it halves the span, every level below doubles it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeorefConfig {
    pub base_size: f64,
    pub pivot_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for GeorefConfig {
    fn default() -> Self {
        Self {
            base_size: 0.2,
            pivot_zoom: 8,
            min_zoom: 1,
            max_zoom: 18,
        }
    }
}

impl GeorefConfig {
    /// Degrees spanned by the longer image side at `zoom`
    pub fn span_at(&self, zoom: u8) -> f64 {
        self.base_size * 2f64.powi(self.pivot_zoom as i32 - zoom as i32)
    }

    pub fn bounds(
        &self,
        center: LatLng,
        zoom: u8,
        width: u32,
        height: u32,
    ) -> Result<GeoBounds, GeorefError> {
        if zoom < self.min_zoom || zoom > self.max_zoom {
            return Err(GeorefError::ZoomOutOfRange {
                zoom,
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if width == 0 || height == 0 {
            return Err(GeorefError::InvalidDimensions { width, height });
        }

        let base = self.span_at(zoom);
        let aspect = width as f64 / height as f64;

        // Box width runs along longitude, height along latitude
        let (lng_span, lat_span) = if aspect >= 1.0 {
            (base, base / aspect)
        } else {
            (base * aspect, base)
        };

        let half_lat = lat_span / 2.0;
        let half_lng = lng_span / 2.0;

        Ok(GeoBounds::new(
            LatLng::new(center.lat - half_lat, center.lng - half_lng),
            LatLng::new(center.lat + half_lat, center.lng + half_lng),
        ))
    }

    /// Derive the custom basemap record for an image at the given view
    pub fn georeference(
        &self,
        image: &ImageSource,
        center: LatLng,
        zoom: u8,
    ) -> Result<CustomTileLayer, GeorefError> {
        let bounds = self.bounds(center, zoom, image.width, image.height)?;
        Ok(CustomTileLayer {
            image_url: image.data_url.clone(),
            bounds,
            width: image.width,
            height: image.height,
        })
    }
}

/// [`GeorefConfig::bounds`] with the default constants
pub fn image_bounds(
    center: LatLng,
    zoom: u8,
    width: u32,
    height: u32,
) -> Result<GeoBounds, GeorefError> {
    GeorefConfig::default().bounds(center, zoom, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wide_image_at_zoom_three() {
        let bounds = image_bounds(LatLng::new(0.0, 0.0), 3, 2048, 1024).unwrap();

        assert_relative_eq!(bounds.south_west.lat, -1.6, epsilon = 1e-12);
        assert_relative_eq!(bounds.south_west.lng, -3.2, epsilon = 1e-12);
        assert_relative_eq!(bounds.north_east.lat, 1.6, epsilon = 1e-12);
        assert_relative_eq!(bounds.north_east.lng, 3.2, epsilon = 1e-12);
    }

    #[test]
    fn test_tall_image_keeps_height() {
        let bounds = image_bounds(LatLng::new(10.0, 20.0), 8, 500, 1000).unwrap();

        assert_relative_eq!(bounds.height(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(bounds.width(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(bounds.center().lat, 10.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.center().lng, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aspect_preserved_and_shrinks_with_zoom() {
        let sizes = [(1, 1), (3, 2), (2, 3), (4000, 300), (17, 900)];
        for (w, h) in sizes {
            let aspect = w as f64 / h as f64;
            let mut previous: Option<GeoBounds> = None;

            for zoom in 1..=18 {
                let bounds = image_bounds(LatLng::new(45.0, -120.0), zoom, w, h).unwrap();
                assert_relative_eq!(bounds.width() / bounds.height(), aspect, max_relative = 1e-9);

                if let Some(prev) = previous {
                    assert!(bounds.width() < prev.width());
                    assert!(bounds.height() < prev.height());
                }
                previous = Some(bounds);
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range_zoom() {
        let center = LatLng::default();
        assert_eq!(
            image_bounds(center, 0, 10, 10),
            Err(GeorefError::ZoomOutOfRange { zoom: 0, min: 1, max: 18 })
        );
        assert!(image_bounds(center, 19, 10, 10).is_err());
    }

    #[test]
    fn test_rejects_empty_image() {
        assert_eq!(
            image_bounds(LatLng::default(), 5, 0, 10),
            Err(GeorefError::InvalidDimensions { width: 0, height: 10 })
        );
        assert!(image_bounds(LatLng::default(), 5, 10, 0).is_err());
    }

    #[test]
    fn test_georeference_builds_layer() {
        let image = ImageSource {
            data_url: "data:image/png;base64,AAAA".into(),
            width: 2048,
            height: 1024,
        };
        let layer = GeorefConfig::default()
            .georeference(&image, LatLng::default(), 3)
            .unwrap();
        assert_eq!(layer.width, 2048);
        assert_eq!(layer.image_url, image.data_url);
        assert_relative_eq!(layer.bounds.width(), 6.4, epsilon = 1e-12);
    }
}
