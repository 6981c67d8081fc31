//! Canonical features and the canonical document.

use super::geometry::{Extent, Geometry, GeometryKind};
use super::property::{FeatureId, Properties, PropertyValue, ID_PROPERTY};
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// One feature of the canonical document. Coordinates are geographic.
///
/// Serializes as a GeoJSON `Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct CanonicalFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

impl CanonicalFeature {
    /// Creates a feature and mirrors its id into `properties.id`.
    pub fn new(id: FeatureId, geometry: Option<Geometry>, properties: Properties) -> Self {
        let mut feature = Self {
            id,
            geometry,
            properties,
        };
        feature.mirror_id();
        feature
    }

    /// Re-establishes `properties.id == id`.
    pub fn mirror_id(&mut self) {
        self.properties
            .insert(ID_PROPERTY.to_string(), self.id.to_property());
    }

    /// True when `properties.id` matches the feature id.
    pub fn id_is_mirrored(&self) -> bool {
        self.properties.get(ID_PROPERTY) == Some(&self.id.to_property())
    }

    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(Geometry::kind)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// The authoritative feature collection.
///
/// Serializes as a GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct CanonicalDocument {
    pub features: Vec<CanonicalFeature>,
}

impl CanonicalDocument {
    pub fn new(features: Vec<CanonicalFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: &FeatureId) -> Option<&CanonicalFeature> {
        self.features.iter().find(|f| &f.id == id)
    }

    pub fn position(&self, id: &FeatureId) -> Option<usize> {
        self.features.iter().position(|f| &f.id == id)
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.iter().map(|f| f.id.clone()).collect()
    }

    /// Distinct geometry kinds present, in kind order.
    pub fn geometry_kinds(&self) -> Vec<GeometryKind> {
        self.features
            .iter()
            .filter_map(CanonicalFeature::geometry_kind)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Union of all feature extents.
    pub fn extent(&self) -> Option<Extent> {
        let mut total: Option<Extent> = None;
        for extent in self
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(Geometry::extent))
        {
            match total.as_mut() {
                Some(t) => t.merge(&extent),
                None => total = Some(extent),
            }
        }
        total
    }

    /// Largest integer id in use, or 0.
    pub fn max_int_id(&self) -> i64 {
        self.features
            .iter()
            .filter_map(|f| f.id.as_int())
            .max()
            .unwrap_or(0)
    }

    /// Checks the document invariants: unique ids and mirrored `properties.id`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::with_capacity(self.features.len());
        for feature in &self.features {
            if !seen.insert(&feature.id) {
                return Err(DocumentError::DuplicateId {
                    id: feature.id.clone(),
                });
            }
            if !feature.id_is_mirrored() {
                return Err(DocumentError::IdNotMirrored {
                    id: feature.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Pretty GeoJSON text of the whole document.
    pub fn to_geojson_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
