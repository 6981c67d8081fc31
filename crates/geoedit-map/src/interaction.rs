//! Interaction mode state machine.
//!
//! One [`InteractionMode`] value is active at a time. Entering a mode
//! supersedes whatever was active; nothing is queued. Transitions that can be
//! rejected are validated before any state changes.

use geoedit_core::{
    CanonicalDocument, DocumentError, EditField, Error, FeatureId, GeometryKind, InteractionMode,
    ModeEvent, Result, UnsupportedGeometryOperationError,
};

/// An edit that was in progress when the mode was left.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub id: FeatureId,
    pub field: EditField,
    /// Text entered so far, `None` if nothing was typed.
    pub text: Option<String>,
}

#[derive(Debug, Default)]
pub struct ModeMachine {
    mode: InteractionMode,
    /// Staged cell or coordinate text while `Editing`.
    pending: Option<String>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode.is_idle()
    }

    /// Text staged for the active edit.
    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Enters `Adding(kind)`.
    pub fn start_add(&mut self, kind: GeometryKind) -> Option<ModeEvent> {
        self.transition(InteractionMode::Adding { kind })
    }

    /// Leaves `Adding`; a no-op in any other mode.
    pub fn cancel_add(&mut self) -> Option<ModeEvent> {
        match self.mode {
            InteractionMode::Adding { .. } => self.transition(InteractionMode::Idle),
            _ => None,
        }
    }

    /// Enters `Moving(id)`.
    ///
    /// Only existing Point features can be moved. On rejection the mode is
    /// left unchanged.
    pub fn start_move(
        &mut self,
        id: &FeatureId,
        document: &CanonicalDocument,
    ) -> Result<Option<ModeEvent>> {
        let feature = document
            .get(id)
            .ok_or_else(|| DocumentError::FeatureNotFound { id: id.clone() })?;
        match feature.geometry_kind() {
            Some(GeometryKind::Point) => {}
            Some(kind) => {
                return Err(UnsupportedGeometryOperationError::MoveRequiresPoint {
                    id: id.clone(),
                    kind,
                }
                .into())
            }
            None => {
                return Err(
                    UnsupportedGeometryOperationError::MissingGeometry { id: id.clone() }.into(),
                )
            }
        }
        Ok(self.transition(InteractionMode::Moving { id: id.clone() }))
    }

    /// Enters `Editing(id, field)`.
    ///
    /// Geometry edits need a geometry to reshape.
    pub fn begin_edit(
        &mut self,
        id: &FeatureId,
        field: EditField,
        document: &CanonicalDocument,
    ) -> Result<Option<ModeEvent>> {
        let feature = document
            .get(id)
            .ok_or_else(|| DocumentError::FeatureNotFound { id: id.clone() })?;
        if field == EditField::Geometry && feature.geometry.is_none() {
            return Err(Error::from(
                UnsupportedGeometryOperationError::MissingGeometry { id: id.clone() },
            ));
        }
        Ok(self.transition(InteractionMode::Editing {
            id: id.clone(),
            field,
        }))
    }

    /// Stages text for the active edit.
    pub fn stage_edit(&mut self, text: impl Into<String>) -> std::result::Result<(), DocumentError> {
        match self.mode {
            InteractionMode::Editing { .. } => {
                self.pending = Some(text.into());
                Ok(())
            }
            _ => Err(DocumentError::NoActiveEdit),
        }
    }

    /// The active edit, without leaving the mode.
    pub fn active_edit(&self) -> Option<PendingEdit> {
        match &self.mode {
            InteractionMode::Editing { id, field } => Some(PendingEdit {
                id: id.clone(),
                field: field.clone(),
                text: self.pending.clone(),
            }),
            _ => None,
        }
    }

    /// Returns to `Idle` from any mode, discarding a staged edit.
    pub fn reset(&mut self) -> Option<ModeEvent> {
        self.transition(InteractionMode::Idle)
    }

    fn transition(&mut self, to: InteractionMode) -> Option<ModeEvent> {
        if self.mode == to {
            return None;
        }
        self.pending = None;
        let from = std::mem::replace(&mut self.mode, to.clone());
        tracing::debug!("Mode {} -> {}", from, to);
        Some(ModeEvent::Changed { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoedit_core::{CanonicalFeature, Coord, Geometry, Properties};

    fn document() -> CanonicalDocument {
        CanonicalDocument::new(vec![
            CanonicalFeature::new(
                FeatureId::Int(7),
                Some(Geometry::Point(Coord(0.0, 0.0))),
                Properties::new(),
            ),
            CanonicalFeature::new(
                FeatureId::Int(8),
                Some(Geometry::LineString(vec![Coord(0.0, 0.0), Coord(1.0, 1.0)])),
                Properties::new(),
            ),
            CanonicalFeature::new(FeatureId::Int(9), None, Properties::new()),
        ])
    }

    #[test]
    fn test_new_mode_supersedes_previous() {
        let doc = document();
        let mut machine = ModeMachine::new();
        machine.start_add(GeometryKind::Polygon);
        let event = machine.start_move(&FeatureId::Int(7), &doc).unwrap();
        assert_eq!(
            event,
            Some(ModeEvent::Changed {
                from: InteractionMode::Adding {
                    kind: GeometryKind::Polygon
                },
                to: InteractionMode::Moving {
                    id: FeatureId::Int(7)
                },
            })
        );
    }

    #[test]
    fn test_move_rejected_for_non_point() {
        let doc = document();
        let mut machine = ModeMachine::new();
        machine.start_add(GeometryKind::Point);

        let err = machine.start_move(&FeatureId::Int(8), &doc).unwrap_err();
        assert!(err.is_unsupported_operation());
        assert!(machine.start_move(&FeatureId::Int(9), &doc).is_err());
        assert!(machine.start_move(&FeatureId::Int(42), &doc).unwrap_err().is_document_error());
        assert_eq!(
            machine.mode(),
            &InteractionMode::Adding {
                kind: GeometryKind::Point
            }
        );
    }

    #[test]
    fn test_cancel_add_only_leaves_adding() {
        let doc = document();
        let mut machine = ModeMachine::new();
        assert!(machine.cancel_add().is_none());
        machine
            .begin_edit(&FeatureId::Int(7), EditField::Property("name".into()), &doc)
            .unwrap();
        assert!(machine.cancel_add().is_none());
        assert_eq!(machine.mode().name(), "Editing");
    }

    #[test]
    fn test_staging_requires_edit_and_is_cleared_on_exit() {
        let doc = document();
        let mut machine = ModeMachine::new();
        assert_eq!(machine.stage_edit("x"), Err(DocumentError::NoActiveEdit));

        machine
            .begin_edit(&FeatureId::Int(7), EditField::Property("name".into()), &doc)
            .unwrap();
        machine.stage_edit("Baku").unwrap();
        assert_eq!(
            machine.active_edit().and_then(|e| e.text),
            Some("Baku".to_string())
        );

        machine.reset();
        assert!(machine.is_idle());
        assert_eq!(machine.pending_text(), None);
    }

    #[test]
    fn test_geometry_edit_needs_geometry() {
        let doc = document();
        let mut machine = ModeMachine::new();
        assert!(machine
            .begin_edit(&FeatureId::Int(9), EditField::Geometry, &doc)
            .is_err());
        assert!(machine.is_idle());
    }
}
