//! # GeoEdit Map
//!
//! Feature state synchronization and editing core. Keeps one canonical
//! feature collection, the map engine's projected copies of it and the
//! table view consistent while the user selects, adds, moves and edits
//! features.
//!
//! ## Components
//!
//! - **Document store**: the single source of truth, geographic coordinates
//! - **Ingestion**: decoded rows or collections to a canonical document
//! - **Transcoder**: geographic <-> projected (spherical mercator)
//! - **Bridge**: diff-by-id mirror sync, styles, gestures, camera
//! - **Interaction**: the Idle/Adding/Moving/Editing mode machine
//! - **Selection**: single selection and camera fit policy
//!
//! ```text
//! Import -> Ingestion -> DocumentStore -> MapBridge -> MapEngine
//!                            ^                           |
//!                            +---- EditorSession <-------+
//!                                  (modes, selection)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoedit_map::{EditorSession, HeadlessEngine};
//!
//! let mut session = EditorSession::new(HeadlessEngine::new(1200.0, 800.0), Config::default());
//! session.import_file("points.csv").await?;
//! session.select(Some(FeatureId::Int(1)));
//! ```

pub mod bridge;
pub mod document_store;
pub mod import;
pub mod ingest;
pub mod interaction;
pub mod selection_manager;
pub mod session;
pub mod transcode;
pub mod viewport;

pub use bridge::{
    EngineCall, FeatureStyle, FitOptions, GestureKind, GestureToken, HeadlessEngine, MapBridge,
    MapEngine, MirrorFeature, Pixel, StyleSheet, SyncReport,
};
pub use document_store::DocumentStore;
pub use import::{CsvDecoder, Decoder, GeoJsonDecoder, ImportFormat, Importer};
pub use ingest::{normalize, parse_wkt, DroppedRow, IngestInput, IngestReport};
pub use interaction::{ModeMachine, PendingEdit};
pub use selection_manager::{CameraMove, SelectionManager};
pub use session::{ClickOutcome, DocumentSummary, EditorSession, IngestOutcome, IngestTicket};
pub use transcode::{transcode, Direction};
pub use viewport::MapViewport;
