//! GeoEdit Settings Crate
//!
//! Viewport, style, map interaction and import settings, persisted as JSON
//! or TOML in the platform configuration directory.

pub mod config;
pub mod error;

pub use config::{
    Config, ImportSettings, MapSettings, StyleSettings, ViewportSettings, CONFIG_DIR_NAME,
    CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult};
