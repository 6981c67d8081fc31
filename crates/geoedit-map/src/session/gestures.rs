//! Add/move modes and map gesture completions.

use super::EditorSession;
use crate::bridge::{GestureToken, MapEngine, Pixel};
use crate::transcode::{is_valid_lon_lat, to_geographic, validate_geographic};
use geoedit_core::{
    CanonicalFeature, CoordinateFormatError, DocumentChange, EditField, FeatureId, Geometry,
    GeometryKind, InteractionMode, Properties, PropertyValue, Result,
    UnsupportedGeometryOperationError,
};

/// What a map click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Idle click: the hit feature was selected, or the selection cleared.
    Selected(Option<FeatureId>),
    /// The feature being moved was placed at the click.
    Moved(FeatureId),
    /// Nothing happened (drawing or editing, or the map is not ready).
    Ignored,
}

impl<E: MapEngine> EditorSession<E> {
    /// Enters `Adding(kind)` and attaches a draw listener.
    ///
    /// Returns the token draw completions must carry.
    pub fn start_add(&mut self, kind: GeometryKind) -> GestureToken {
        let event = self.modes.start_add(kind);
        if let (None, Some(token)) = (&event, self.bridge.active_gesture()) {
            return token;
        }
        let token = self.bridge.start_draw(kind);
        self.publish_mode(event);
        token
    }

    /// Leaves `Adding` and detaches the draw listener.
    pub fn cancel_add(&mut self) -> bool {
        match self.modes.cancel_add() {
            Some(event) => {
                self.bridge.stop_gesture();
                self.publish_mode(Some(event));
                true
            }
            None => false,
        }
    }

    /// Enters `Moving(id)`. Only Point features can be moved; anything else
    /// is rejected and the current mode is kept.
    pub fn start_move(&mut self, id: &FeatureId) -> Result<()> {
        let document = self.store.document();
        match self.modes.start_move(id, &document) {
            Ok(event) => {
                if event.is_some() {
                    self.bridge.stop_gesture();
                }
                self.publish_mode(event);
                Ok(())
            }
            Err(err) => Err(self.reject("start_move", err)),
        }
    }

    /// Routes a click on the map according to the active mode.
    pub fn handle_map_click(&mut self, pixel: Pixel) -> Result<ClickOutcome> {
        match self.modes.mode().clone() {
            InteractionMode::Moving { id } => {
                let Some(projected) = self.bridge.pixel_to_coordinate(pixel) else {
                    return Ok(ClickOutcome::Ignored);
                };
                let location = to_geographic(projected);
                if !is_valid_lon_lat(&location) {
                    let err = CoordinateFormatError::OutOfRange {
                        lon: location.x(),
                        lat: location.y(),
                    };
                    return Err(self.reject("move", err));
                }
                if let Err(err) = self.store.move_point(&id, location) {
                    return Err(self.reject("move", err));
                }
                tracing::info!("Moved feature {} to ({}, {})", id, location.x(), location.y());
                self.after_document_change(DocumentChange::GeometryUpdated { id: id.clone() });
                self.leave_mode();
                Ok(ClickOutcome::Moved(id))
            }
            InteractionMode::Idle => {
                let hit = self
                    .bridge
                    .feature_at_pixel(pixel, self.config.map.hit_tolerance_px);
                Ok(ClickOutcome::Selected(self.select(hit)))
            }
            InteractionMode::Adding { .. } | InteractionMode::Editing { .. } => {
                Ok(ClickOutcome::Ignored)
            }
        }
    }

    /// Handles a finished draw gesture carrying a projected geometry.
    ///
    /// Completions from a listener that is no longer active are discarded
    /// (`Ok(None)`). A geometry of the wrong kind cancels the add. Otherwise
    /// a feature is created with the next unused id, and selected.
    pub fn handle_draw_complete(
        &mut self,
        token: GestureToken,
        projected: Geometry,
    ) -> Result<Option<FeatureId>> {
        let kind = match self.modes.mode() {
            InteractionMode::Adding { kind } if self.bridge.accept_gesture(token) => *kind,
            _ => {
                tracing::warn!("Discarding stale draw completion from {}", token);
                return Ok(None);
            }
        };
        if projected.kind() != kind {
            self.leave_mode();
            let err = UnsupportedGeometryOperationError::KindMismatch {
                expected: kind,
                found: projected.kind(),
            };
            return Err(self.reject("add", err));
        }
        let geometry = self.bridge.to_geographic(&projected);
        if let Err(err) = validate_geographic(&geometry) {
            self.leave_mode();
            return Err(self.reject("add", err));
        }

        self.leave_mode();
        let id = match self.store.allocate_id() {
            Ok(id) => id,
            Err(err) => return Err(self.reject("add", err)),
        };
        let mut properties = Properties::new();
        properties.insert(
            "name".to_string(),
            PropertyValue::String(format!("New {} {}", kind, id)),
        );
        self.store
            .upsert_feature(CanonicalFeature::new(id.clone(), Some(geometry), properties));
        tracing::info!("Added {} feature {}", kind, id);
        self.after_document_change(DocumentChange::FeatureUpserted { id: id.clone() });
        self.select(Some(id.clone()));
        Ok(Some(id))
    }

    /// Handles a finished modify gesture carrying a projected geometry.
    ///
    /// Returns `Ok(false)` for completions from a listener that is no longer
    /// active. A rejected geometry keeps the feature and the mode unchanged.
    pub fn handle_modify_complete(&mut self, token: GestureToken, projected: Geometry) -> Result<bool> {
        let id = match self.modes.mode() {
            InteractionMode::Editing {
                id,
                field: EditField::Geometry,
            } if self.bridge.accept_gesture(token) => id.clone(),
            _ => {
                tracing::warn!("Discarding stale modify completion from {}", token);
                return Ok(false);
            }
        };
        let geometry = self.bridge.to_geographic(&projected);
        self.update_geometry(&id, geometry)?;
        self.leave_mode();
        Ok(true)
    }
}
