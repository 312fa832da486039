//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes.

use serde::{Deserialize, Serialize};

use crate::map::georef::GeorefConfig;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub tiles: TileConfig,
    pub custom_image: CustomImageConfig,
    pub georef: GeorefConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{section}: minZoom {min} is greater than maxZoom {max}")]
    InvertedZoomRange {
        section: &'static str,
        min: u8,
        max: u8,
    },

    #[error("georef.baseSize must be a positive number, got {0}")]
    InvalidBaseSize(f64),
}

impl EngineConfig {
    /// Parse and validate a config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("tiles", self.tiles.min_zoom, self.tiles.max_zoom),
            ("customImage", self.custom_image.min_zoom, self.custom_image.max_zoom),
            ("georef", self.georef.min_zoom, self.georef.max_zoom),
        ];
        for (section, min, max) in ranges {
            if min > max {
                return Err(ConfigError::InvertedZoomRange { section, min, max });
            }
        }

        let base_size = self.georef.base_size;
        if !base_size.is_finite() || base_size <= 0.0 {
            return Err(ConfigError::InvalidBaseSize(base_size));
        }
        Ok(())
    }
}

/// Remote tile basemap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileConfig {
    pub url_template: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned(),
            attribution: "&copy; OpenStreetMap contributors".to_owned(),
            min_zoom: 1,
            max_zoom: 18,
        }
    }
}

/// Viewport limits while a custom image is the basemap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomImageConfig {
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for CustomImageConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1,
            max_zoom: 8,
        }
    }
}
