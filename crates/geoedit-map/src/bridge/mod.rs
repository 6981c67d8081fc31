//! Map synchronization bridge.
//!
//! Keeps the engine's features the exact projected image of the canonical
//! document, and owns the single active gesture listener. While the engine
//! is not ready every engine-facing operation is recorded instead of issued,
//! and the recorded work is flushed once the surface becomes ready.

pub mod engine;
pub mod mirror;
pub mod style;

pub use engine::{
    EngineCall, FitOptions, GestureKind, GestureToken, HeadlessEngine, MapEngine, Pixel,
};
pub use mirror::{MirrorDiff, MirrorFeature, MirrorSet};
pub use style::{FeatureStyle, StyleSheet};

use crate::selection_manager::{camera_for_document, camera_for_feature, CameraMove};
use crate::transcode::{transcode, Direction};
use geoedit_core::{
    CanonicalDocument, Coord, EngineNotReadyError, FeatureId, Geometry, GeometryKind,
};
use geoedit_settings::ViewportSettings;

/// Outcome of one document synchronization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub created: Vec<FeatureId>,
    pub updated: Vec<FeatureId>,
    pub removed: Vec<FeatureId>,
    /// A modify gesture whose target was removed and which was detached.
    pub interrupted_gesture: Option<GestureToken>,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    token: GestureToken,
    kind: GestureKind,
    attached: bool,
}

/// Work recorded while the engine is not ready.
#[derive(Debug, Default)]
struct PendingWork {
    /// Ids dropped from the document since the engine last saw the set.
    removed: Vec<FeatureId>,
    camera: Option<CameraMove>,
}

pub struct MapBridge<E: MapEngine> {
    engine: E,
    mirrors: MirrorSet,
    styles: StyleSheet,
    selected: Option<FeatureId>,
    gesture: Option<ActiveGesture>,
    next_token: u64,
    layer_created: bool,
    /// The engine has received the layer and the full mirror set.
    live: bool,
    pending: PendingWork,
}

impl<E: MapEngine> MapBridge<E> {
    pub fn new(engine: E, styles: StyleSheet) -> Self {
        Self {
            engine,
            mirrors: MirrorSet::new(),
            styles,
            selected: None,
            gesture: None,
            next_token: 1,
            layer_created: false,
            live: false,
            pending: PendingWork::default(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn mirrors(&self) -> &MirrorSet {
        &self.mirrors
    }

    pub fn mirror(&self, id: &FeatureId) -> Option<&MirrorFeature> {
        self.mirrors.get(id)
    }

    /// Mirror ids in document order.
    pub fn mirror_ids(&self) -> Vec<FeatureId> {
        self.mirrors.ids().to_vec()
    }

    /// Whether the engine is currently receiving operations.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Brings the engine up to date once its surface is ready.
    ///
    /// Returns `false` (and does nothing) while the engine is still not
    /// ready. Safe to call repeatedly.
    pub fn on_ready(&mut self) -> bool {
        self.ensure_live("ready").is_ok()
    }

    /// Reconciles mirrors with `document`.
    ///
    /// A modify gesture is only interrupted when one of its targets is gone.
    pub fn sync(&mut self, document: &CanonicalDocument, revision: u64) -> SyncReport {
        let diff = self.mirrors.reconcile(document, revision);
        let mut report = SyncReport {
            created: diff.created,
            updated: diff.updated,
            removed: diff.removed,
            interrupted_gesture: None,
        };

        let lost_target = match &self.gesture {
            Some(ActiveGesture {
                kind: GestureKind::Modify(ids),
                ..
            }) => ids.iter().any(|id| report.removed.contains(id)),
            _ => false,
        };
        if lost_target {
            report.interrupted_gesture = self.stop_gesture();
        }
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !self.mirrors.contains(id))
        {
            self.selected = None;
        }

        match self.ensure_live("set_features") {
            Ok(true) => {}
            Ok(false) => {
                let changed: Vec<&MirrorFeature> = report
                    .created
                    .iter()
                    .chain(report.updated.iter())
                    .filter_map(|id| self.mirrors.get(id))
                    .collect();
                if !changed.is_empty() || !report.removed.is_empty() {
                    self.engine.set_features(&changed, &report.removed);
                }
                for id in &report.created {
                    let style = self.styles.style_for(id, self.selected.as_ref());
                    self.engine.set_feature_style(id, style);
                }
            }
            Err(err) => {
                tracing::debug!("{}; sync deferred", err);
                self.pending.removed.extend(report.removed.iter().cloned());
            }
        }

        tracing::debug!(
            "Synced mirrors at r{}: +{} ~{} -{}",
            revision,
            report.created.len(),
            report.updated.len(),
            report.removed.len()
        );
        report
    }

    /// Re-evaluates styles after a selection change.
    ///
    /// Only the previously and newly selected features are restyled.
    pub fn restyle(&mut self, selected: Option<&FeatureId>) {
        if self.selected.as_ref() == selected {
            return;
        }
        let previous = std::mem::replace(&mut self.selected, selected.cloned());
        if let Ok(false) = self.ensure_live("set_feature_style") {
            for id in previous.iter().chain(self.selected.iter()) {
                if self.mirrors.contains(id) {
                    let style = self.styles.style_for(id, self.selected.as_ref());
                    self.engine.set_feature_style(id, style);
                }
            }
        }
    }

    /// Fits the camera to one feature's projected geometry.
    ///
    /// Returns `false` when the feature has no mirror or no geometry.
    pub fn fit_feature(&mut self, id: &FeatureId, policy: &ViewportSettings) -> bool {
        let camera = self
            .mirrors
            .get(id)
            .and_then(|m| m.geometry.as_ref())
            .and_then(|g| camera_for_feature(g, policy));
        match camera {
            Some(camera) => {
                self.apply_camera(camera);
                true
            }
            None => false,
        }
    }

    /// Fits the camera to the whole document, or the default view if empty.
    pub fn fit_document(&mut self, policy: &ViewportSettings) {
        let camera = camera_for_document(self.mirrors.extent(), policy);
        self.apply_camera(camera);
    }

    /// Issues a camera move, or keeps it (replacing any older one) until the
    /// engine is ready.
    pub fn apply_camera(&mut self, camera: CameraMove) {
        match self.ensure_live("camera") {
            Ok(_) => self.issue_camera(camera),
            Err(err) => {
                tracing::debug!("{}; camera move deferred", err);
                self.pending.camera = Some(camera);
            }
        }
    }

    /// Attaches a draw listener, detaching any active listener first.
    pub fn start_draw(&mut self, kind: GeometryKind) -> GestureToken {
        self.attach(GestureKind::Draw(kind))
    }

    /// Attaches a modify listener on `ids`, detaching any active listener first.
    pub fn start_modify(&mut self, ids: &[FeatureId]) -> GestureToken {
        self.attach(GestureKind::Modify(ids.to_vec()))
    }

    /// Detaches the active gesture listener, if any.
    pub fn stop_gesture(&mut self) -> Option<GestureToken> {
        let gesture = self.gesture.take()?;
        if gesture.attached {
            self.engine.stop_gesture(gesture.token);
        }
        tracing::debug!("Detached {}", gesture.token);
        Some(gesture.token)
    }

    pub fn active_gesture(&self) -> Option<GestureToken> {
        self.gesture.as_ref().map(|g| g.token)
    }

    pub fn active_gesture_kind(&self) -> Option<&GestureKind> {
        self.gesture.as_ref().map(|g| &g.kind)
    }

    /// Whether a completion tagged with `token` belongs to the active listener.
    pub fn accept_gesture(&self, token: GestureToken) -> bool {
        self.active_gesture() == Some(token)
    }

    /// Projected coordinate under a pixel; `None` while the engine is not ready.
    pub fn pixel_to_coordinate(&mut self, pixel: Pixel) -> Option<Coord> {
        match self.ensure_live("pixel_to_coordinate") {
            Ok(_) => Some(self.engine.pixel_to_coordinate(pixel)),
            Err(_) => None,
        }
    }

    /// Feature under a pixel; `None` while the engine is not ready.
    pub fn feature_at_pixel(&mut self, pixel: Pixel, tolerance_px: f64) -> Option<FeatureId> {
        match self.ensure_live("feature_at_pixel") {
            Ok(_) => self.engine.feature_at_pixel(pixel, tolerance_px),
            Err(_) => None,
        }
    }

    /// Converts a geometry produced by a gesture back to geographic space.
    pub fn to_geographic(&self, projected: &Geometry) -> Geometry {
        transcode(projected, Direction::ToGeographic)
    }

    fn attach(&mut self, kind: GestureKind) -> GestureToken {
        self.stop_gesture();
        let token = GestureToken(self.next_token);
        self.next_token += 1;
        self.gesture = Some(ActiveGesture {
            token,
            kind,
            attached: false,
        });
        match self.ensure_live("gesture") {
            Ok(true) => {}
            Ok(false) => self.attach_active(),
            Err(err) => tracing::debug!("{}; {} deferred", err, token),
        }
        token
    }

    fn attach_active(&mut self) {
        if let Some(gesture) = self.gesture.as_mut() {
            if gesture.attached {
                return;
            }
            match &gesture.kind {
                GestureKind::Draw(kind) => self.engine.start_draw(gesture.token, *kind),
                GestureKind::Modify(ids) => self.engine.start_modify(gesture.token, ids),
            }
            gesture.attached = true;
            tracing::debug!("Attached {}", gesture.token);
        }
    }

    fn issue_camera(&mut self, camera: CameraMove) {
        match camera {
            CameraMove::Fit { extent, options } => self.engine.fit_view(&extent, options),
            CameraMove::AnimateTo {
                center,
                zoom,
                duration_ms,
            } => self.engine.animate_to(center, zoom, duration_ms),
        }
    }

    /// Makes sure the engine may receive operations.
    ///
    /// `Ok(true)` means the engine was just brought up to date (and already
    /// received the full mirror set), `Ok(false)` that it was live before.
    fn ensure_live(&mut self, operation: &str) -> Result<bool, EngineNotReadyError> {
        if !self.engine.is_ready() {
            self.live = false;
            return Err(EngineNotReadyError::NotReady {
                operation: operation.to_string(),
            });
        }
        if self.live {
            return Ok(false);
        }
        self.flush();
        Ok(true)
    }

    fn flush(&mut self) {
        if !self.layer_created {
            self.engine.create_feature_layer();
            self.layer_created = true;
        }
        let removed = std::mem::take(&mut self.pending.removed);
        let all: Vec<&MirrorFeature> = self.mirrors.iter().collect();
        self.engine.set_features(&all, &removed);
        for mirror in self.mirrors.iter() {
            let style = self.styles.style_for(&mirror.id, self.selected.as_ref());
            self.engine.set_feature_style(&mirror.id, style);
        }
        self.attach_active();
        if let Some(camera) = self.pending.camera.take() {
            self.issue_camera(camera);
        }
        self.live = true;
        tracing::info!("Map engine ready; flushed {} features", self.mirrors.len());
    }
}
