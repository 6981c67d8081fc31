//! Error handling for GeoEdit
//!
//! Provides error types for every boundary of the editing core:
//! - Ingestion errors (unrecognized or malformed input)
//! - Coordinate errors (hand-edited coordinate text)
//! - Unsupported geometry operations (e.g. moving a polygon)
//! - Engine readiness (internal, absorbed by queuing)
//! - Document errors (unknown ids, read-only columns)
//!
//! All error types use `thiserror`. None of them is fatal: every operation
//! that fails leaves the previously valid state untouched.

use crate::data::{FeatureId, GeometryKind};
use thiserror::Error;

/// Ingestion error type
///
/// Raised when decoded input cannot be turned into a canonical document.
/// The document in the store is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestionFormatError {
    /// Input declares a feature collection but has no `features` sequence
    #[error("Feature collection has no 'features' array")]
    MissingFeatures,

    /// Top-level JSON is not a feature collection
    #[error("Expected a FeatureCollection, found {found}")]
    NotAFeatureCollection {
        /// What the input declared itself to be.
        found: String,
    },

    /// Tabular input without latitude/longitude or WKT columns
    #[error("No geometry column found (columns: {columns})")]
    NoGeometryField {
        /// The column names that were present.
        columns: String,
    },

    /// Extension not handled by any decoder
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The offending extension.
        extension: String,
    },

    /// File exceeds the configured size limit
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Input text is not valid JSON
    #[error("Invalid JSON: {reason}")]
    InvalidJson {
        /// Parser message.
        reason: String,
    },

    /// Tabular text could not be split into rows
    #[error("Invalid table at line {line}: {reason}")]
    InvalidTable {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Input is empty
    #[error("Input is empty")]
    Empty,

    /// Decoder collaborator failed
    #[error("Decoder failed: {reason}")]
    Decode {
        /// Decoder message.
        reason: String,
    },
}

/// Coordinate error type
///
/// Raised when coordinate text or nested arrays fail to parse or validate.
/// The edit is rejected and the previous geometry retained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateFormatError {
    /// Text is not valid JSON
    #[error("Coordinates are not valid JSON: {reason}")]
    InvalidJson {
        /// Parser message.
        reason: String,
    },

    /// A node that should be an array is not
    #[error("Expected an array at {path}")]
    NotAnArray {
        /// Location in the nested arrays.
        path: String,
    },

    /// An empty array where coordinates were expected
    #[error("Empty coordinate array at {path}")]
    Empty {
        /// Location in the nested arrays.
        path: String,
    },

    /// A coordinate leaf is not a pair
    #[error("Coordinate at {path} has {len} values, expected 2")]
    BadLeaf {
        /// Location in the nested arrays.
        path: String,
        /// Number of values found.
        len: usize,
    },

    /// A coordinate value is not a finite number
    #[error("Coordinate value at {path} is not a finite number")]
    NotANumber {
        /// Location in the nested arrays.
        path: String,
    },

    /// Siblings are nested to different depths
    #[error("Inconsistent nesting: expected depth {expected}, found {found}")]
    RaggedNesting {
        /// Depth of the first sibling.
        expected: usize,
        /// Depth of the disagreeing sibling.
        found: usize,
    },

    /// Nesting depth does not match the geometry kind
    #[error("{kind} coordinates must be nested {expected} deep, found {found}")]
    DepthMismatch {
        /// Geometry kind being built.
        kind: GeometryKind,
        /// Required depth.
        expected: usize,
        /// Actual depth.
        found: usize,
    },

    /// Geographic coordinate outside lon/lat range
    #[error("Coordinate ({lon}, {lat}) is outside the valid longitude/latitude range")]
    OutOfRange {
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },

    /// Found a coordinate pair where a sequence was expected
    #[error("Unexpected coordinate pair")]
    UnexpectedLeaf,

    /// Found a sequence where a coordinate pair was expected
    #[error("Unexpected coordinate sequence")]
    UnexpectedBranch,

    /// Well-known text could not be parsed
    #[error("Invalid WKT: {reason}")]
    InvalidWkt {
        /// What was wrong.
        reason: String,
    },
}

/// Unsupported geometry operation error type
///
/// Rejected at the mode-transition boundary; the active mode is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnsupportedGeometryOperationError {
    /// Move is only defined for points
    #[error("Feature {id} is a {kind}; only Point features can be moved")]
    MoveRequiresPoint {
        /// Target feature.
        id: FeatureId,
        /// Its geometry kind.
        kind: GeometryKind,
    },

    /// The feature has no geometry to operate on
    #[error("Feature {id} has no geometry")]
    MissingGeometry {
        /// Target feature.
        id: FeatureId,
    },

    /// A drawn geometry does not match the requested kind
    #[error("Expected a {expected}, got a {found}")]
    KindMismatch {
        /// Kind the add mode was started with.
        expected: GeometryKind,
        /// Kind that was delivered.
        found: GeometryKind,
    },
}

/// Engine readiness error type
///
/// Internal only: bridge operations issued before the map surface is ready
/// are queued instead of surfacing this.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineNotReadyError {
    /// The display surface has not been initialized yet
    #[error("Map engine not ready for {operation}")]
    NotReady {
        /// The operation that was deferred.
        operation: String,
    },
}

/// Document error type
///
/// Raised by the canonical document store when a mutation would break
/// its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// No feature with this id exists
    #[error("Feature {id} not found")]
    FeatureNotFound {
        /// Requested id.
        id: FeatureId,
    },

    /// Two features share an id
    #[error("Duplicate feature id {id}")]
    DuplicateId {
        /// The repeated id.
        id: FeatureId,
    },

    /// `properties.id` disagrees with the feature id
    #[error("Feature {id} does not mirror its id into properties")]
    IdNotMirrored {
        /// The feature id.
        id: FeatureId,
    },

    /// The property cannot be edited
    #[error("Property '{key}' is read-only")]
    ReadOnlyProperty {
        /// Column name.
        key: String,
    },

    /// No edit is in progress to commit or cancel
    #[error("No edit in progress")]
    NoActiveEdit,

    /// Every integer id up to `i64::MAX` has been handed out
    #[error("No unused integer feature id left")]
    IdSpaceExhausted,
}

/// Main error type for GeoEdit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Ingestion error
    #[error(transparent)]
    Ingestion(#[from] IngestionFormatError),

    /// Coordinate error
    #[error(transparent)]
    Coordinate(#[from] CoordinateFormatError),

    /// Unsupported geometry operation
    #[error(transparent)]
    UnsupportedOperation(#[from] UnsupportedGeometryOperationError),

    /// Engine not ready
    #[error(transparent)]
    EngineNotReady(#[from] EngineNotReadyError),

    /// Document invariant violation
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error from a string message
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is an ingestion error
    pub fn is_ingestion_error(&self) -> bool {
        matches!(self, Error::Ingestion(_))
    }

    /// Check if this is a coordinate error
    pub fn is_coordinate_error(&self) -> bool {
        matches!(self, Error::Coordinate(_))
    }

    /// Check if this is an unsupported operation error
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, Error::UnsupportedOperation(_))
    }

    /// Check if this is a document error
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Document(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err: Error = CoordinateFormatError::Empty {
            path: "$".to_string(),
        }
        .into();
        assert!(err.is_coordinate_error());
        assert!(!err.is_ingestion_error());

        let err: Error = UnsupportedGeometryOperationError::MoveRequiresPoint {
            id: FeatureId::Int(3),
            kind: GeometryKind::Polygon,
        }
        .into();
        assert!(err.is_unsupported_operation());
        assert_eq!(
            err.to_string(),
            "Feature 3 is a Polygon; only Point features can be moved"
        );
    }
}
