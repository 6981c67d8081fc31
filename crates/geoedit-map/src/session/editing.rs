//! Property and geometry edits from the table and coordinate editor.

use super::EditorSession;
use crate::bridge::MapEngine;
use crate::transcode::{geometry_from_text, validate_geographic};
use geoedit_core::{
    CanonicalFeature, CoordinateTree, DocumentChange, DocumentError, EditField, FeatureId,
    Geometry, GeometryKind, InteractionMode, PropertyValue, Result,
};

impl<E: MapEngine> EditorSession<E> {
    /// Enters `Editing(id, field)`. A geometry edit also attaches a modify
    /// gesture to the feature on the map.
    pub fn begin_edit(&mut self, id: &FeatureId, field: EditField) -> Result<()> {
        let document = self.store.document();
        let event = match self.modes.begin_edit(id, field.clone(), &document) {
            Ok(event) => event,
            Err(err) => return Err(self.reject("begin_edit", err)),
        };
        if event.is_some() {
            self.bridge.stop_gesture();
            if field == EditField::Geometry {
                self.bridge.start_modify(std::slice::from_ref(id));
            }
        }
        self.publish_mode(event);
        Ok(())
    }

    /// Stages the text typed so far for the active edit.
    pub fn stage_edit(&mut self, text: impl Into<String>) -> Result<()> {
        self.modes.stage_edit(text)?;
        Ok(())
    }

    /// Persists the staged text and returns to `Idle`.
    ///
    /// When the text is rejected the session stays in `Editing` with the
    /// text still staged, and the stored value is unchanged.
    pub fn commit_edit(&mut self) -> Result<()> {
        let edit = self
            .modes
            .active_edit()
            .ok_or(DocumentError::NoActiveEdit)?;
        if let Some(text) = &edit.text {
            match &edit.field {
                EditField::Property(key) => {
                    let previous = self
                        .store
                        .get(&edit.id)
                        .and_then(|f| f.property(key))
                        .cloned();
                    let value = PropertyValue::from_edit(previous.as_ref(), text);
                    self.update_property(&edit.id, key, value)?;
                }
                EditField::Geometry => self.update_geometry_from_text(&edit.id, text)?,
            }
        }
        self.leave_mode();
        Ok(())
    }

    /// Leaves `Editing` without persisting anything.
    pub fn cancel_edit(&mut self) -> bool {
        if matches!(self.modes.mode(), InteractionMode::Editing { .. }) {
            self.leave_mode();
            true
        } else {
            false
        }
    }

    /// Sets one property. The `id` column is read-only.
    pub fn update_property(&mut self, id: &FeatureId, key: &str, value: PropertyValue) -> Result<()> {
        if let Err(err) = self.store.update_property(id, key, value) {
            return Err(self.reject("update_property", err));
        }
        self.after_document_change(DocumentChange::PropertyUpdated {
            id: id.clone(),
            key: key.to_string(),
        });
        Ok(())
    }

    /// Inserts or overwrites a whole feature. `properties.id` is re-mirrored
    /// from the feature id.
    pub fn upsert_feature(&mut self, feature: CanonicalFeature) -> Result<()> {
        if let Some(geometry) = &feature.geometry {
            if let Err(err) = validate_geographic(geometry) {
                return Err(self.reject("upsert_feature", err));
            }
        }
        let id = feature.id.clone();
        self.store.upsert_feature(feature);
        self.after_document_change(DocumentChange::FeatureUpserted { id });
        Ok(())
    }

    /// Replaces a feature's geometry with a geographic geometry.
    pub fn update_geometry(&mut self, id: &FeatureId, geometry: Geometry) -> Result<()> {
        if let Err(err) = validate_geographic(&geometry) {
            return Err(self.reject("update_geometry", err));
        }
        if let Err(err) = self.store.update_geometry(id, geometry) {
            return Err(self.reject("update_geometry", err));
        }
        self.after_document_change(DocumentChange::GeometryUpdated { id: id.clone() });
        Ok(())
    }

    /// Replaces a feature's geometry from edited coordinate text.
    ///
    /// The text must be nested as deep as the feature's geometry kind
    /// requires. A feature without geometry takes the kind implied by the
    /// nesting. On any error the stored geometry is kept.
    pub fn update_geometry_from_text(&mut self, id: &FeatureId, text: &str) -> Result<()> {
        let kind = match self.store.get(id) {
            Some(feature) => feature.geometry_kind(),
            None => {
                let err = DocumentError::FeatureNotFound { id: id.clone() };
                return Err(self.reject("update_geometry", err));
            }
        };
        let parsed = match kind {
            Some(kind) => geometry_from_text(kind, text),
            None => CoordinateTree::from_text(text)
                .and_then(|tree| tree.depth())
                .and_then(|depth| geometry_from_text(kind_for_depth(depth), text)),
        };
        match parsed {
            Ok(geometry) => self.update_geometry(id, geometry),
            Err(err) => Err(self.reject("update_geometry", err)),
        }
    }
}

/// Geometry kind implied by coordinate nesting, for features without one.
fn kind_for_depth(depth: usize) -> GeometryKind {
    match depth {
        0 => GeometryKind::Point,
        1 => GeometryKind::LineString,
        2 => GeometryKind::Polygon,
        _ => GeometryKind::MultiPolygon,
    }
}
