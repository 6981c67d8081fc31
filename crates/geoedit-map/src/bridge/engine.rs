//! Map engine collaborator.
//!
//! The engine renders mirror features, captures draw/modify gestures and
//! hit-tests clicks. It works purely in projected coordinates. Gesture
//! completions are delivered back to the session tagged with the
//! [`GestureToken`] that registered them.

use super::mirror::MirrorFeature;
use super::style::FeatureStyle;
use crate::viewport::MapViewport;
use geoedit_core::{Coord, Extent, FeatureId, GeometryKind};
use std::collections::HashMap;
use std::fmt;

/// Screen position in pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Identifies one attached gesture listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureToken(pub u64);

impl fmt::Display for GestureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gesture#{}", self.0)
    }
}

/// What a gesture listener captures.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureKind {
    /// Drawing a new geometry of this kind.
    Draw(GeometryKind),
    /// Reshaping existing features.
    Modify(Vec<FeatureId>),
}

/// Camera fit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub padding_px: f64,
    pub max_zoom: f64,
    pub duration_ms: u64,
}

/// Operations the bridge needs from a map engine.
///
/// Callers must only invoke these once [`MapEngine::is_ready`] returns true;
/// the bridge queues everything until then.
pub trait MapEngine {
    /// Whether the display surface is initialized (non-zero size).
    fn is_ready(&self) -> bool;

    /// Creates the vector layer that holds mirror features.
    fn create_feature_layer(&mut self);

    /// Drops `removed` features, then inserts or replaces `changed` ones by id.
    fn set_features(&mut self, changed: &[&MirrorFeature], removed: &[FeatureId]);

    fn set_feature_style(&mut self, id: &FeatureId, style: &FeatureStyle);

    /// Projected coordinate under a pixel.
    fn pixel_to_coordinate(&self, pixel: Pixel) -> Coord;

    /// Topmost feature within `tolerance_px` of the pixel.
    fn feature_at_pixel(&self, pixel: Pixel, tolerance_px: f64) -> Option<FeatureId>;

    fn start_draw(&mut self, token: GestureToken, kind: GeometryKind);

    fn start_modify(&mut self, token: GestureToken, ids: &[FeatureId]);

    fn stop_gesture(&mut self, token: GestureToken);

    fn fit_view(&mut self, extent: &Extent, options: FitOptions);

    /// Moves the camera to `center`; `zoom` of `None` keeps the current zoom.
    fn animate_to(&mut self, center: Coord, zoom: Option<f64>, duration_ms: u64);
}

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreateLayer,
    SetFeatures {
        changed: Vec<FeatureId>,
        removed: Vec<FeatureId>,
    },
    SetStyle {
        id: FeatureId,
        style: FeatureStyle,
    },
    StartDraw {
        token: GestureToken,
        kind: GeometryKind,
    },
    StartModify {
        token: GestureToken,
        ids: Vec<FeatureId>,
    },
    StopGesture {
        token: GestureToken,
    },
    FitView {
        extent: Extent,
        options: FitOptions,
    },
    AnimateTo {
        center: Coord,
        zoom: Option<f64>,
        duration_ms: u64,
    },
}

/// In-memory engine without a display.
///
/// Camera moves apply instantly. Hit testing uses mirror extents. Every call
/// is appended to a log so callers can inspect what the bridge did.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    viewport: MapViewport,
    layer_created: bool,
    features: HashMap<FeatureId, MirrorFeature>,
    order: Vec<FeatureId>,
    styles: HashMap<FeatureId, FeatureStyle>,
    gestures: Vec<(GestureToken, GestureKind)>,
    calls: Vec<EngineCall>,
}

impl HeadlessEngine {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: MapViewport::new(width, height),
            ..Self::default()
        }
    }

    /// An engine whose surface has not been laid out yet.
    pub fn unready() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
    }

    pub fn viewport(&self) -> &MapViewport {
        &self.viewport
    }

    pub fn layer_created(&self) -> bool {
        self.layer_created
    }

    pub fn feature(&self, id: &FeatureId) -> Option<&MirrorFeature> {
        self.features.get(id)
    }

    /// Feature ids in draw order.
    pub fn feature_ids(&self) -> &[FeatureId] {
        &self.order
    }

    pub fn style(&self, id: &FeatureId) -> Option<&FeatureStyle> {
        self.styles.get(id)
    }

    /// Gesture listeners currently attached.
    pub fn gestures(&self) -> &[(GestureToken, GestureKind)] {
        &self.gestures
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Camera calls (fits and animations) in order.
    pub fn camera_calls(&self) -> Vec<&EngineCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, EngineCall::FitView { .. } | EngineCall::AnimateTo { .. }))
            .collect()
    }

    /// Pixel position of a projected coordinate.
    pub fn coordinate_to_pixel(&self, c: Coord) -> Pixel {
        let (x, y) = self.viewport.projected_to_pixel(c);
        Pixel::new(x, y)
    }
}

impl MapEngine for HeadlessEngine {
    fn is_ready(&self) -> bool {
        self.viewport.has_area()
    }

    fn create_feature_layer(&mut self) {
        self.layer_created = true;
        self.calls.push(EngineCall::CreateLayer);
    }

    fn set_features(&mut self, changed: &[&MirrorFeature], removed: &[FeatureId]) {
        for id in removed {
            self.features.remove(id);
            self.styles.remove(id);
        }
        self.order.retain(|id| !removed.contains(id));
        for mirror in changed {
            if self
                .features
                .insert(mirror.id.clone(), (*mirror).clone())
                .is_none()
            {
                self.order.push(mirror.id.clone());
            }
        }
        self.calls.push(EngineCall::SetFeatures {
            changed: changed.iter().map(|m| m.id.clone()).collect(),
            removed: removed.to_vec(),
        });
    }

    fn set_feature_style(&mut self, id: &FeatureId, style: &FeatureStyle) {
        self.styles.insert(id.clone(), style.clone());
        self.calls.push(EngineCall::SetStyle {
            id: id.clone(),
            style: style.clone(),
        });
    }

    fn pixel_to_coordinate(&self, pixel: Pixel) -> Coord {
        self.viewport.pixel_to_projected(pixel.x, pixel.y)
    }

    fn feature_at_pixel(&self, pixel: Pixel, tolerance_px: f64) -> Option<FeatureId> {
        let at = self.pixel_to_coordinate(pixel);
        let tolerance = tolerance_px * self.viewport.resolution();
        self.order
            .iter()
            .rev()
            .find(|id| {
                self.features
                    .get(*id)
                    .and_then(MirrorFeature::extent)
                    .is_some_and(|e| e.contains(&at, tolerance))
            })
            .cloned()
    }

    fn start_draw(&mut self, token: GestureToken, kind: GeometryKind) {
        self.gestures.push((token, GestureKind::Draw(kind)));
        self.calls.push(EngineCall::StartDraw { token, kind });
    }

    fn start_modify(&mut self, token: GestureToken, ids: &[FeatureId]) {
        self.gestures.push((token, GestureKind::Modify(ids.to_vec())));
        self.calls.push(EngineCall::StartModify {
            token,
            ids: ids.to_vec(),
        });
    }

    fn stop_gesture(&mut self, token: GestureToken) {
        self.gestures.retain(|(t, _)| *t != token);
        self.calls.push(EngineCall::StopGesture { token });
    }

    fn fit_view(&mut self, extent: &Extent, options: FitOptions) {
        self.viewport
            .fit_extent(extent, options.padding_px, options.max_zoom);
        self.calls.push(EngineCall::FitView {
            extent: *extent,
            options,
        });
    }

    fn animate_to(&mut self, center: Coord, zoom: Option<f64>, duration_ms: u64) {
        self.viewport.center_on(center);
        if let Some(zoom) = zoom {
            self.viewport.set_zoom(zoom);
        }
        self.calls.push(EngineCall::AnimateTo {
            center,
            zoom,
            duration_ms,
        });
    }
}
