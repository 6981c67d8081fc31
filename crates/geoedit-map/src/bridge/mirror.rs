//! Projected mirror copies of canonical features.
//!
//! The [`MirrorSet`] is an arena keyed by feature id and is owned by the
//! bridge alone. Reconciling it against a document diffs by id, so mirrors
//! of unchanged features keep their identity and revision.

use crate::transcode::{transcode, Direction};
use geoedit_core::{CanonicalDocument, CanonicalFeature, Extent, FeatureId, Geometry};
use std::collections::{HashMap, HashSet};

/// Engine-side copy of one feature, with projected geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry>,
    /// Store revision that last changed this mirror.
    pub revision: u64,
}

impl MirrorFeature {
    pub fn from_canonical(feature: &CanonicalFeature, revision: u64) -> Self {
        Self {
            id: feature.id.clone(),
            geometry: project(feature),
            revision,
        }
    }

    /// Projected extent of the geometry.
    pub fn extent(&self) -> Option<Extent> {
        self.geometry.as_ref().and_then(Geometry::extent)
    }
}

fn project(feature: &CanonicalFeature) -> Option<Geometry> {
    feature
        .geometry
        .as_ref()
        .map(|g| transcode(g, Direction::ToProjected))
}

/// Ids touched by one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorDiff {
    pub created: Vec<FeatureId>,
    pub updated: Vec<FeatureId>,
    pub removed: Vec<FeatureId>,
}

impl MirrorDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Arena of mirror features in document order.
#[derive(Debug, Clone, Default)]
pub struct MirrorSet {
    features: HashMap<FeatureId, MirrorFeature>,
    order: Vec<FeatureId>,
}

impl MirrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &FeatureId) -> Option<&MirrorFeature> {
        self.features.get(id)
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.features.contains_key(id)
    }

    /// Ids in document order.
    pub fn ids(&self) -> &[FeatureId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &MirrorFeature> {
        self.order.iter().filter_map(|id| self.features.get(id))
    }

    /// Union of all projected extents.
    pub fn extent(&self) -> Option<Extent> {
        self.iter()
            .filter_map(MirrorFeature::extent)
            .reduce(|mut total, e| {
                total.merge(&e);
                total
            })
    }

    /// Makes the set the exact projected image of `document`.
    ///
    /// Mirrors whose projected geometry is unchanged are left untouched.
    pub fn reconcile(&mut self, document: &CanonicalDocument, revision: u64) -> MirrorDiff {
        let mut diff = MirrorDiff::default();
        let mut seen: HashSet<&FeatureId> = HashSet::with_capacity(document.len());

        for feature in &document.features {
            seen.insert(&feature.id);
            match self.features.get_mut(&feature.id) {
                Some(mirror) => {
                    let geometry = project(feature);
                    if mirror.geometry != geometry {
                        mirror.geometry = geometry;
                        mirror.revision = revision;
                        diff.updated.push(feature.id.clone());
                    }
                }
                None => {
                    self.features.insert(
                        feature.id.clone(),
                        MirrorFeature::from_canonical(feature, revision),
                    );
                    diff.created.push(feature.id.clone());
                }
            }
        }

        self.features.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                diff.removed.push(id.clone());
            }
            keep
        });
        diff.removed.sort();
        self.order = document.ids();
        diff
    }
}
