//! Canonical document store.
//!
//! Holds the single authoritative [`CanonicalDocument`]. Every mutation is
//! synchronous, produces a new document value and publishes a
//! [`DocumentEvent`] carrying that value. The previous value is never
//! modified in place: readers holding an `Arc` from before the mutation keep
//! seeing a complete, consistent document.

use geoedit_core::{
    AppEvent, CanonicalDocument, CanonicalFeature, Coord, DocumentChange, DocumentError,
    DocumentEvent, Error, EventBus, FeatureId, Geometry, GeometryKind, Properties, PropertyValue,
    UnsupportedGeometryOperationError, ID_PROPERTY,
};
use std::sync::Arc;

/// Property names recognized as latitude columns (case-insensitive).
pub const LATITUDE_KEYS: [&str; 2] = ["latitude", "lat"];

/// Property names recognized as longitude columns (case-insensitive).
pub const LONGITUDE_KEYS: [&str; 4] = ["longitude", "lon", "lng", "long"];

/// Owner of the canonical document.
pub struct DocumentStore {
    document: Arc<CanonicalDocument>,
    revision: u64,
    /// Next integer id handed out by [`DocumentStore::allocate_id`]. Only
    /// ever grows, so ids are never reused within a session; `None` once
    /// `i64::MAX` has been taken.
    next_id: Option<i64>,
    bus: Arc<EventBus>,
}

impl DocumentStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            document: Arc::new(CanonicalDocument::default()),
            revision: 0,
            next_id: Some(1),
            bus,
        }
    }

    /// The current document value.
    pub fn document(&self) -> Arc<CanonicalDocument> {
        Arc::clone(&self.document)
    }

    pub fn get(&self, id: &FeatureId) -> Option<&CanonicalFeature> {
        self.document.get(id)
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.document.contains(id)
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the whole document in one step.
    ///
    /// The new document must already satisfy the invariants; it is rejected
    /// untouched otherwise.
    pub fn replace(&mut self, document: CanonicalDocument) -> Result<(), DocumentError> {
        document.validate()?;
        self.reserve_ids(&document);
        tracing::info!("Document replaced ({} features)", document.len());
        self.document = Arc::new(document);
        self.commit(DocumentChange::Replaced);
        Ok(())
    }

    /// Inserts a feature, or overwrites the feature with the same id.
    ///
    /// `properties.id` is re-mirrored from the feature id.
    pub fn upsert_feature(&mut self, mut feature: CanonicalFeature) {
        feature.mirror_id();
        if let Some(i) = feature.id.as_int() {
            self.reserve(i);
        }
        let id = feature.id.clone();
        let doc = Arc::make_mut(&mut self.document);
        match doc.position(&id) {
            Some(pos) => doc.features[pos] = feature,
            None => doc.features.push(feature),
        }
        tracing::debug!("Feature {} upserted", id);
        self.commit(DocumentChange::FeatureUpserted { id });
    }

    /// Hands out the next never-used integer id.
    ///
    /// Fails once the integer range is used up; an id already handed out or
    /// present in the document is never returned.
    pub fn allocate_id(&mut self) -> Result<FeatureId, DocumentError> {
        let floor = self.document.max_int_id().checked_add(1);
        let id = match (self.next_id, floor) {
            (Some(next), Some(floor)) => next.max(floor),
            _ => return Err(DocumentError::IdSpaceExhausted),
        };
        self.next_id = id.checked_add(1);
        Ok(FeatureId::Int(id))
    }

    /// Creates a feature with a freshly allocated id and returns that id.
    pub fn insert_new(
        &mut self,
        geometry: Geometry,
        properties: Properties,
    ) -> Result<FeatureId, DocumentError> {
        let id = self.allocate_id()?;
        self.upsert_feature(CanonicalFeature::new(id.clone(), Some(geometry), properties));
        Ok(id)
    }

    /// Sets one property of a feature.
    ///
    /// The `id` column mirrors the feature id and cannot be edited.
    pub fn update_property(
        &mut self,
        id: &FeatureId,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), DocumentError> {
        if key == ID_PROPERTY {
            return Err(DocumentError::ReadOnlyProperty {
                key: key.to_string(),
            });
        }
        let pos = self.position(id)?;
        let doc = Arc::make_mut(&mut self.document);
        doc.features[pos]
            .properties
            .insert(key.to_string(), value);
        self.commit(DocumentChange::PropertyUpdated {
            id: id.clone(),
            key: key.to_string(),
        });
        Ok(())
    }

    /// Replaces the geometry of a feature. The geometry must be geographic.
    pub fn update_geometry(&mut self, id: &FeatureId, geometry: Geometry) -> Result<(), DocumentError> {
        let pos = self.position(id)?;
        let doc = Arc::make_mut(&mut self.document);
        doc.features[pos].geometry = Some(geometry);
        self.commit(DocumentChange::GeometryUpdated { id: id.clone() });
        Ok(())
    }

    /// Moves a point feature to `location` and, in the same mutation,
    /// rewrites any latitude/longitude columns it already carries.
    ///
    /// Any other geometry is left as it is and rejected.
    pub fn move_point(&mut self, id: &FeatureId, location: Coord) -> Result<(), Error> {
        let pos = self.position(id)?;
        match self.document.features[pos].geometry_kind() {
            Some(GeometryKind::Point) => {}
            Some(kind) => {
                return Err(UnsupportedGeometryOperationError::MoveRequiresPoint {
                    id: id.clone(),
                    kind,
                }
                .into())
            }
            None => {
                return Err(UnsupportedGeometryOperationError::MissingGeometry { id: id.clone() }.into())
            }
        }
        let doc = Arc::make_mut(&mut self.document);
        let feature = &mut doc.features[pos];
        feature.geometry = Some(Geometry::Point(location));
        for (key, value) in feature.properties.iter_mut() {
            let lower = key.to_ascii_lowercase();
            if LONGITUDE_KEYS.contains(&lower.as_str()) {
                *value = PropertyValue::from_f64(location.x());
            } else if LATITUDE_KEYS.contains(&lower.as_str()) {
                *value = PropertyValue::from_f64(location.y());
            }
        }
        self.commit(DocumentChange::GeometryUpdated { id: id.clone() });
        Ok(())
    }

    /// Empties the document. Allocated ids stay reserved.
    pub fn clear(&mut self) {
        tracing::info!("Document cleared");
        self.document = Arc::new(CanonicalDocument::default());
        self.commit(DocumentChange::Cleared);
    }

    fn position(&self, id: &FeatureId) -> Result<usize, DocumentError> {
        self.document
            .position(id)
            .ok_or_else(|| DocumentError::FeatureNotFound { id: id.clone() })
    }

    fn reserve_ids(&mut self, document: &CanonicalDocument) {
        if document.features.iter().any(|f| f.id.as_int().is_some()) {
            self.reserve(document.max_int_id());
        }
    }

    /// Keeps `taken` and everything below it from being allocated.
    fn reserve(&mut self, taken: i64) {
        self.next_id = match self.next_id {
            Some(next) if next > taken => Some(next),
            Some(_) => taken.checked_add(1),
            None => None,
        };
    }

    fn commit(&mut self, change: DocumentChange) {
        self.revision += 1;
        let event = AppEvent::Document(DocumentEvent::Changed {
            revision: self.revision,
            change,
            document: Arc::clone(&self.document),
        });
        self.bus.publish(event);
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("features", &self.document.len())
            .field("revision", &self.revision)
            .field("next_id", &self.next_id)
            .finish()
    }
}
