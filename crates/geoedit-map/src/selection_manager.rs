use crate::bridge::FitOptions;
use crate::transcode::to_projected;
use geoedit_core::{CanonicalDocument, Coord, Extent, FeatureId, Geometry, SelectionEvent};
use geoedit_settings::ViewportSettings;

/// Tracks the single selected feature.
///
/// `SelectionManager` owns the selection shared by the table and the map:
/// both surfaces select through it and both observe the same value.
///
/// # Selection Model
///
/// - At most one feature is selected at a time
/// - A selection is only valid while its feature exists in the document;
///   selecting an unknown id is treated as deselection
/// - Every change is reported as a [`SelectionEvent`]; re-selecting the
///   current feature is not a change
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    /// The selected feature id, if any
    selected: Option<FeatureId>,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with no selection.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoedit_map::selection_manager::SelectionManager;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.selected(), None);
    /// ```
    pub fn new() -> Self {
        Self { selected: None }
    }

    /// Returns the selected feature id.
    pub fn selected(&self) -> Option<&FeatureId> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &FeatureId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Selects `id`, or clears the selection for `None`.
    ///
    /// # Arguments
    ///
    /// * `id` - Feature to select
    /// * `document` - Current document, used to reject unknown ids
    ///
    /// # Returns
    ///
    /// The change event, or `None` when the selection did not change.
    pub fn select(
        &mut self,
        id: Option<FeatureId>,
        document: &CanonicalDocument,
    ) -> Option<SelectionEvent> {
        let resolved = id.filter(|id| document.contains(id));
        self.set(resolved)
    }

    /// Clears the selection.
    pub fn clear(&mut self) -> Option<SelectionEvent> {
        self.set(None)
    }

    /// Drops the selection if its feature no longer exists.
    pub fn reconcile(&mut self, document: &CanonicalDocument) -> Option<SelectionEvent> {
        match &self.selected {
            Some(id) if !document.contains(id) => self.set(None),
            _ => None,
        }
    }

    fn set(&mut self, selected: Option<FeatureId>) -> Option<SelectionEvent> {
        if self.selected == selected {
            return None;
        }
        let previous = std::mem::replace(&mut self.selected, selected.clone());
        Some(SelectionEvent::Changed { previous, selected })
    }
}

/// A camera instruction for the map engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraMove {
    /// Fit a projected extent.
    Fit { extent: Extent, options: FitOptions },
    /// Move to a projected center; `zoom` of `None` keeps the current zoom.
    AnimateTo {
        center: Coord,
        zoom: Option<f64>,
        duration_ms: u64,
    },
}

/// Camera move for a selected feature, from its projected geometry.
///
/// Points (and shapes collapsed to a single position) are shown at the fixed
/// point zoom. Lines and polygons are fitted to their extent, except when the
/// extent is larger than the configured threshold: those are only
/// re-centered.
pub fn camera_for_feature(projected: &Geometry, policy: &ViewportSettings) -> Option<CameraMove> {
    let extent = projected.extent()?;
    if matches!(projected, Geometry::Point(_)) || extent.is_point() {
        return Some(CameraMove::AnimateTo {
            center: extent.center(),
            zoom: Some(policy.point_zoom),
            duration_ms: policy.fit_duration_ms,
        });
    }
    if extent.largest_dimension() > policy.large_extent_threshold_m {
        return Some(CameraMove::AnimateTo {
            center: extent.center(),
            zoom: None,
            duration_ms: policy.fit_duration_ms,
        });
    }
    Some(CameraMove::Fit {
        extent,
        options: FitOptions {
            padding_px: policy.feature_padding_px,
            max_zoom: policy.feature_max_zoom,
            duration_ms: policy.fit_duration_ms,
        },
    })
}

/// Camera move after the whole document changed.
///
/// An empty (or geometry-less) document returns to the default view.
pub fn camera_for_document(projected_extent: Option<Extent>, policy: &ViewportSettings) -> CameraMove {
    match projected_extent {
        Some(extent) => CameraMove::Fit {
            extent,
            options: FitOptions {
                padding_px: policy.document_padding_px,
                max_zoom: policy.document_max_zoom,
                duration_ms: policy.fit_duration_ms,
            },
        },
        None => {
            let (lon, lat) = policy.default_center;
            CameraMove::AnimateTo {
                center: to_projected(Coord(lon, lat)),
                zoom: Some(policy.default_zoom),
                duration_ms: policy.default_view_duration_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoedit_core::{CanonicalFeature, Properties};

    fn doc(ids: &[i64]) -> CanonicalDocument {
        CanonicalDocument::new(
            ids.iter()
                .map(|i| {
                    CanonicalFeature::new(
                        FeatureId::Int(*i),
                        Some(Geometry::Point(Coord(0.0, 0.0))),
                        Properties::new(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_select_and_reselect() {
        let document = doc(&[1, 2]);
        let mut manager = SelectionManager::new();

        let event = manager.select(Some(FeatureId::Int(2)), &document);
        assert_eq!(
            event,
            Some(SelectionEvent::Changed {
                previous: None,
                selected: Some(FeatureId::Int(2)),
            })
        );
        assert!(manager.select(Some(FeatureId::Int(2)), &document).is_none());
        assert!(manager.is_selected(&FeatureId::Int(2)));
    }

    #[test]
    fn test_unknown_id_deselects() {
        let document = doc(&[1]);
        let mut manager = SelectionManager::new();
        manager.select(Some(FeatureId::Int(1)), &document);

        let event = manager.select(Some(FeatureId::Int(99)), &document);
        assert_eq!(
            event,
            Some(SelectionEvent::Changed {
                previous: Some(FeatureId::Int(1)),
                selected: None,
            })
        );
        assert_eq!(manager.selected(), None);
    }

    #[test]
    fn test_reconcile_drops_vanished_selection() {
        let mut manager = SelectionManager::new();
        manager.select(Some(FeatureId::Int(1)), &doc(&[1, 2]));
        assert!(manager.reconcile(&doc(&[1])).is_none());
        assert!(manager.reconcile(&doc(&[2])).is_some());
        assert_eq!(manager.selected(), None);
    }

    #[test]
    fn test_point_uses_fixed_zoom() {
        let policy = ViewportSettings::default();
        let mv = camera_for_feature(&Geometry::Point(Coord(100.0, 200.0)), &policy);
        assert_eq!(
            mv,
            Some(CameraMove::AnimateTo {
                center: Coord(100.0, 200.0),
                zoom: Some(16.0),
                duration_ms: 800,
            })
        );
    }

    #[test]
    fn test_polygon_fits_with_padding() {
        let policy = ViewportSettings::default();
        let ring = vec![
            Coord(0.0, 0.0),
            Coord(1000.0, 0.0),
            Coord(1000.0, 500.0),
            Coord(0.0, 0.0),
        ];
        match camera_for_feature(&Geometry::Polygon(vec![ring]), &policy) {
            Some(CameraMove::Fit { extent, options }) => {
                assert_eq!(extent, Extent::new(0.0, 0.0, 1000.0, 500.0));
                assert_eq!(options.padding_px, 50.0);
                assert_eq!(options.max_zoom, 16.0);
            }
            other => panic!("expected fit, got {:?}", other),
        }
    }

    #[test]
    fn test_large_extent_only_recenters() {
        let policy = ViewportSettings::default();
        let line = Geometry::LineString(vec![Coord(0.0, 0.0), Coord(3_000_000.0, 10.0)]);
        match camera_for_feature(&line, &policy) {
            Some(CameraMove::AnimateTo { center, zoom, .. }) => {
                assert_eq!(zoom, None);
                assert_eq!(center, Coord(1_500_000.0, 5.0));
            }
            other => panic!("expected re-center, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_returns_to_default_view() {
        let policy = ViewportSettings::default();
        match camera_for_document(None, &policy) {
            CameraMove::AnimateTo {
                zoom, duration_ms, ..
            } => {
                assert_eq!(zoom, Some(7.0));
                assert_eq!(duration_ms, 500);
            }
            other => panic!("expected default view, got {:?}", other),
        }
    }
}
