//! # GeoEdit Core
//!
//! Core types for GeoEdit.
//! Provides the canonical feature model, the error taxonomy shared by
//! every layer, and the event bus used to notify map and table views.

pub mod constants;
pub mod data;
pub mod error;
pub mod event_bus;

pub use data::{
    CanonicalDocument, CanonicalFeature, Coord, CoordinateTree, EditField, Extent, FeatureId,
    Geometry, GeometryKind, InteractionMode, Properties, PropertyValue, GEOMETRY_TYPE_PROPERTY,
    ID_PROPERTY,
};

pub use error::{
    CoordinateFormatError, DocumentError, EngineNotReadyError, Error, IngestionFormatError,
    Result, UnsupportedGeometryOperationError,
};

pub use event_bus::{
    AppEvent, DocumentChange, DocumentEvent, ErrorEvent, EventBus, EventCategory, EventFilter,
    IngestEvent, ModeEvent, SelectionEvent, SubscriptionId,
};
