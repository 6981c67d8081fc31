//! Interaction mode values.

use super::geometry::GeometryKind;
use super::property::FeatureId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What part of a feature an edit targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditField {
    /// A property cell in the table, by column name.
    Property(String),
    /// The feature geometry, reshaped on the map.
    Geometry,
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditField::Property(key) => write!(f, "property '{}'", key),
            EditField::Geometry => write!(f, "geometry"),
        }
    }
}

/// The single active user interaction.
///
/// Exactly one value is current at any time, so two interactions can never
/// be active together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Idle,
    Adding {
        kind: GeometryKind,
    },
    Moving {
        id: FeatureId,
    },
    Editing {
        id: FeatureId,
        field: EditField,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    /// The feature this mode targets, if any.
    pub fn target(&self) -> Option<&FeatureId> {
        match self {
            InteractionMode::Moving { id } | InteractionMode::Editing { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "Idle",
            InteractionMode::Adding { .. } => "Adding",
            InteractionMode::Moving { .. } => "Moving",
            InteractionMode::Editing { .. } => "Editing",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::Idle => write!(f, "Idle"),
            InteractionMode::Adding { kind } => write!(f, "Adding({})", kind),
            InteractionMode::Moving { id } => write!(f, "Moving({})", id),
            InteractionMode::Editing { id, field } => write!(f, "Editing({}, {})", id, field),
        }
    }
}
