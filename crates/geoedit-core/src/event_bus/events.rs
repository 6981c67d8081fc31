//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so they can be logged or replayed.
//! Document events carry the new document value by `Arc`, so listeners see
//! a complete, immutable snapshot and never a half-applied mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{CanonicalDocument, FeatureId, InteractionMode};

/// Root event enum for all session events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Canonical document mutations
    Document(DocumentEvent),
    /// Selection changes
    Selection(SelectionEvent),
    /// Interaction mode transitions
    Mode(ModeEvent),
    /// Ingestion results
    Ingest(IngestEvent),
    /// Rejected operations
    Error(ErrorEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Document(_) => EventCategory::Document,
            AppEvent::Selection(_) => EventCategory::Selection,
            AppEvent::Mode(_) => EventCategory::Mode,
            AppEvent::Ingest(_) => EventCategory::Ingest,
            AppEvent::Error(_) => EventCategory::Error,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Document(e) => e.description(),
            AppEvent::Selection(e) => e.description(),
            AppEvent::Mode(e) => e.description(),
            AppEvent::Ingest(e) => e.description(),
            AppEvent::Error(e) => e.description(),
        }
    }

    /// True when the event concerns feature `id`: a targeted document
    /// change, a replacement or clear, or a selection moving to or from it.
    pub fn touches(&self, id: &FeatureId) -> bool {
        match self {
            AppEvent::Document(DocumentEvent::Changed { change, .. }) => match change {
                DocumentChange::Replaced | DocumentChange::Cleared => true,
                DocumentChange::FeatureUpserted { id: target }
                | DocumentChange::PropertyUpdated { id: target, .. }
                | DocumentChange::GeometryUpdated { id: target } => target == id,
            },
            AppEvent::Selection(SelectionEvent::Changed { previous, selected }) => {
                previous.as_ref() == Some(id) || selected.as_ref() == Some(id)
            }
            AppEvent::Mode(ModeEvent::Changed { from, to }) => {
                from.target() == Some(id) || to.target() == Some(id)
            }
            AppEvent::Ingest(_) | AppEvent::Error(_) => false,
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Document mutation events.
    Document,
    /// Selection events.
    Selection,
    /// Interaction mode events.
    Mode,
    /// Ingestion events.
    Ingest,
    /// Rejected operation events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Document => write!(f, "Document"),
            EventCategory::Selection => write!(f, "Selection"),
            EventCategory::Mode => write!(f, "Mode"),
            EventCategory::Ingest => write!(f, "Ingest"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// Which mutation produced a document change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentChange {
    /// Whole document replaced
    Replaced,
    /// A feature was inserted or overwritten
    FeatureUpserted { id: FeatureId },
    /// A single property changed
    PropertyUpdated { id: FeatureId, key: String },
    /// A geometry changed
    GeometryUpdated { id: FeatureId },
    /// Document cleared
    Cleared,
}

/// Canonical document events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocumentEvent {
    /// The document changed; `document` is the new value
    Changed {
        /// Monotonic store revision after the change.
        revision: u64,
        /// What happened.
        change: DocumentChange,
        /// The complete new document.
        document: Arc<CanonicalDocument>,
    },
}

impl DocumentEvent {
    pub fn description(&self) -> String {
        match self {
            DocumentEvent::Changed {
                revision,
                change,
                document,
            } => format!(
                "Document r{} {:?} ({} features)",
                revision,
                change,
                document.len()
            ),
        }
    }
}

/// Selection events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// Selected feature changed
    Changed {
        /// Previously selected id.
        previous: Option<FeatureId>,
        /// Newly selected id, `None` for deselection.
        selected: Option<FeatureId>,
    },
}

impl SelectionEvent {
    pub fn description(&self) -> String {
        match self {
            SelectionEvent::Changed { selected: Some(id), .. } => format!("Selected {}", id),
            SelectionEvent::Changed { selected: None, .. } => "Selection cleared".to_string(),
        }
    }
}

/// Interaction mode events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeEvent {
    /// Mode transition
    Changed {
        /// Mode before the transition.
        from: InteractionMode,
        /// Mode after the transition.
        to: InteractionMode,
    },
}

impl ModeEvent {
    pub fn description(&self) -> String {
        match self {
            ModeEvent::Changed { from, to } => format!("Mode {} -> {}", from, to),
        }
    }
}

/// Ingestion events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngestEvent {
    /// A result was applied to the store
    Applied {
        /// Sequence number of the ingestion.
        sequence: u64,
        /// Features in the new document.
        features: usize,
        /// Rows or features dropped during normalization.
        dropped: usize,
        /// When the result was applied.
        at: DateTime<Utc>,
    },
    /// A result arrived after a newer one had been applied
    Discarded {
        /// Sequence number of the stale ingestion.
        sequence: u64,
        /// Sequence number currently shown.
        current: u64,
    },
    /// Ingestion failed; the document was left unchanged
    Failed {
        /// Sequence number of the failed ingestion.
        sequence: u64,
        /// Error message for display.
        message: String,
    },
}

impl IngestEvent {
    pub fn description(&self) -> String {
        match self {
            IngestEvent::Applied {
                sequence,
                features,
                dropped,
                ..
            } => format!(
                "Ingest #{} applied: {} features, {} dropped",
                sequence, features, dropped
            ),
            IngestEvent::Discarded { sequence, current } => {
                format!("Ingest #{} discarded (showing #{})", sequence, current)
            }
            IngestEvent::Failed { sequence, message } => {
                format!("Ingest #{} failed: {}", sequence, message)
            }
        }
    }
}

/// Rejected operation events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorEvent {
    /// A user-triggered operation was rejected
    Rejected {
        /// Operation name.
        operation: String,
        /// Error message for display.
        message: String,
    },
}

impl ErrorEvent {
    pub fn description(&self) -> String {
        match self {
            ErrorEvent::Rejected { operation, message } => {
                format!("{} rejected: {}", operation, message)
            }
        }
    }
}
