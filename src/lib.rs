//! # GeoEdit
//!
//! Import, view and edit geospatial features with a map and a table that
//! always agree.
//!
//! ## Architecture
//!
//! GeoEdit is organized as a workspace with multiple crates:
//!
//! 1. **geoedit-core** - Feature data model, errors, event bus
//! 2. **geoedit-settings** - Viewport, style, map and import configuration
//! 3. **geoedit-map** - Document store, ingestion, coordinate transcoding,
//!    map synchronization, interaction modes and the editor session
//! 4. **geoedit** - Logging setup and the headless command line tool
//!
//! ## Features
//!
//! - **Formats**: CSV with lat/lon or WKT columns, GeoJSON, layered archives
//! - **Single source of truth**: one canonical document drives map and table
//! - **Editing**: add, move and reshape features, edit properties in place
//! - **Export**: standalone GeoJSON

pub use geoedit_core::{
    CanonicalDocument, CanonicalFeature, Coord, Error, FeatureId, Geometry, GeometryKind,
    InteractionMode, PropertyValue, Result,
};
pub use geoedit_map::{
    ClickOutcome, DocumentSummary, EditorSession, HeadlessEngine, ImportFormat, IngestInput,
    IngestOutcome, MapEngine,
};
pub use geoedit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, so command output on stdout stays machine readable
/// - RUST_LOG environment variable support, `info` by default
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with(LogFormat::Pretty)
}

/// Initialize logging in the given format.
pub fn init_logging_with(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .pretty();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
