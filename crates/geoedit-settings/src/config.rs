//! Configuration for GeoEdit
//!
//! Supports JSON and TOML file formats stored in the platform configuration
//! directory. Configuration is organized into sections:
//! - Viewport policy (default view, fit padding, zoom limits)
//! - Feature styles (default and selected)
//! - Map interaction (click hit tolerance)
//! - Import limits (per-format file size caps)

use crate::error::{ConfigError, ConfigResult};
use geoedit_core::constants::{DEFAULT_CENTER_LON_LAT, DEFAULT_ZOOM, MAX_ZOOM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "geoedit";

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const MIB: u64 = 1024 * 1024;

/// Camera policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// View center (lon, lat) used when the document is empty
    pub default_center: (f64, f64),
    /// Zoom used when the document is empty
    pub default_zoom: f64,
    /// Animation duration when returning to the default view
    pub default_view_duration_ms: u64,
    /// Padding in pixels around a selected line or polygon
    pub feature_padding_px: f64,
    /// Maximum zoom when fitting a selected feature
    pub feature_max_zoom: f64,
    /// Zoom used when a point is selected
    pub point_zoom: f64,
    /// Camera animation duration for selection fits
    pub fit_duration_ms: u64,
    /// Extents larger than this (projected metres) are only re-centered
    pub large_extent_threshold_m: f64,
    /// Padding in pixels when fitting the whole document
    pub document_padding_px: f64,
    /// Maximum zoom when fitting the whole document
    pub document_max_zoom: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER_LON_LAT,
            default_zoom: DEFAULT_ZOOM,
            default_view_duration_ms: 500,
            feature_padding_px: 50.0,
            feature_max_zoom: 16.0,
            point_zoom: 16.0,
            fit_duration_ms: 800,
            large_extent_threshold_m: 2_000_000.0,
            document_padding_px: 20.0,
            document_max_zoom: 18.0,
        }
    }
}

/// Feature style settings
///
/// Colours are CSS colour strings handed to the map engine unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub default_stroke: String,
    pub default_fill: String,
    pub default_stroke_width: f64,
    pub selected_stroke: String,
    pub selected_fill: String,
    pub selected_stroke_width: f64,
    /// Radius of point markers in pixels
    pub point_radius: f64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            default_stroke: "blue".to_string(),
            default_fill: "rgba(0, 0, 255, 0.3)".to_string(),
            default_stroke_width: 2.0,
            selected_stroke: "red".to_string(),
            selected_fill: "rgba(255, 0, 0, 0.3)".to_string(),
            selected_stroke_width: 3.0,
            point_radius: 6.0,
        }
    }
}

/// Map interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Click hit tolerance in pixels
    pub hit_tolerance_px: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            hit_tolerance_px: 8.0,
        }
    }
}

/// Import size limits in bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub csv_max_bytes: u64,
    pub geojson_max_bytes: u64,
    pub zip_max_bytes: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            csv_max_bytes: 50 * MIB,
            geojson_max_bytes: 30 * MIB,
            zip_max_bytes: 50 * MIB,
        }
    }
}

impl ImportSettings {
    /// Size limit for a file extension, `None` when the extension is unknown.
    pub fn limit_for(&self, extension: &str) -> Option<u64> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(self.csv_max_bytes),
            "json" | "geojson" => Some(self.geojson_max_bytes),
            "zip" => Some(self.zip_max_bytes),
            _ => None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportSettings,
    pub style: StyleSettings,
    pub map: MapSettings,
    pub import: ImportSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, `<config dir>/geoedit/config.toml`.
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDirectory)
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default() -> ConfigResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::read(path))?;

        let config: Self = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ConfigError::write(parent))?;
            }
        }
        std::fs::write(path, content).map_err(ConfigError::write(path))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let v = &self.viewport;
        let (lon, lat) = v.default_center;
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigError::out_of_range("viewport.default_center.lon", lon));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ConfigError::out_of_range("viewport.default_center.lat", lat));
        }

        for (key, zoom) in [
            ("viewport.default_zoom", v.default_zoom),
            ("viewport.feature_max_zoom", v.feature_max_zoom),
            ("viewport.point_zoom", v.point_zoom),
            ("viewport.document_max_zoom", v.document_max_zoom),
        ] {
            if zoom.is_nan() || zoom <= 0.0 || zoom > MAX_ZOOM {
                return Err(ConfigError::out_of_range(key, zoom));
            }
        }

        if v.fit_duration_ms == 0 {
            return Err(ConfigError::out_of_range("viewport.fit_duration_ms", 0));
        }

        for (key, padding) in [
            ("viewport.feature_padding_px", v.feature_padding_px),
            ("viewport.document_padding_px", v.document_padding_px),
            ("map.hit_tolerance_px", self.map.hit_tolerance_px),
        ] {
            if padding.is_nan() || padding < 0.0 {
                return Err(ConfigError::out_of_range(key, padding));
            }
        }

        if v.large_extent_threshold_m.is_nan() || v.large_extent_threshold_m <= 0.0 {
            return Err(ConfigError::out_of_range(
                "viewport.large_extent_threshold_m",
                v.large_extent_threshold_m,
            ));
        }

        if self.style.default_stroke_width <= 0.0 || self.style.selected_stroke_width <= 0.0 {
            return Err(ConfigError::out_of_range(
                "style.stroke_width",
                self.style.default_stroke_width.min(self.style.selected_stroke_width),
            ));
        }

        if self.style.point_radius <= 0.0 {
            return Err(ConfigError::out_of_range(
                "style.point_radius",
                self.style.point_radius,
            ));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
