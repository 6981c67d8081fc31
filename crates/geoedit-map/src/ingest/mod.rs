//! Ingestion normalizer.
//!
//! Turns already-decoded input into a valid [`CanonicalDocument`]:
//! - table rows with latitude/longitude columns become points
//! - table rows with a WKT column are parsed into their geometry kind
//! - feature collections keep their geometries; missing or empty
//!   properties are replaced by `{id, geometryType}`
//! - features without an id get `index + 1` (`"<layer>_<n>"` for
//!   multi-layer input), mirrored into `properties.id`
//!
//! Rows or features whose geometry cannot be read are dropped and reported
//! in [`IngestReport::dropped`]; they are never lost silently.

pub mod wkt;

pub use wkt::parse_wkt;

use crate::document_store::{LATITUDE_KEYS, LONGITUDE_KEYS};
use geoedit_core::{
    CanonicalDocument, CanonicalFeature, Coord, CoordinateTree, FeatureId, Geometry,
    GeometryKind, IngestionFormatError, Properties, PropertyValue, GEOMETRY_TYPE_PROPERTY,
    ID_PROPERTY,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Property names recognized as WKT geometry columns (case-insensitive).
pub const WKT_KEYS: [&str; 4] = ["wkt", "geometry", "geom", "the_geom"];

/// One decoded table row.
pub type Row = Map<String, Value>;

/// Decoded input handed to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestInput {
    /// Table rows, typically from CSV
    Rows(Vec<Row>),
    /// Parsed JSON: a feature collection or an array of row objects
    Json(Value),
    /// Several feature collections, e.g. the layers of a shapefile archive
    Layers(Vec<Value>),
}

/// A row or feature that did not make it into the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    /// 0-based position in the input (across layers for multi-layer input).
    pub index: usize,
    pub reason: String,
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub document: CanonicalDocument,
    pub dropped: Vec<DroppedRow>,
}

impl IngestReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Normalizes decoded input into a canonical document.
pub fn normalize(input: IngestInput) -> Result<IngestReport, IngestionFormatError> {
    let report = match input {
        IngestInput::Rows(rows) => normalize_rows(&rows)?,
        IngestInput::Json(value) => normalize_json(&value)?,
        IngestInput::Layers(layers) => normalize_layers(&layers)?,
    };
    tracing::info!(
        "Normalized {} features ({} dropped)",
        report.document.len(),
        report.dropped.len()
    );
    for dropped in &report.dropped {
        tracing::warn!("Dropped input #{}: {}", dropped.index, dropped.reason);
    }
    Ok(report)
}

/// Normalizes parsed JSON: a feature collection, or an array of row objects.
pub fn normalize_json(value: &Value) -> Result<IngestReport, IngestionFormatError> {
    match value {
        Value::Array(items) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object()
                        .cloned()
                        .ok_or_else(|| IngestionFormatError::InvalidTable {
                            line: i + 1,
                            reason: "row is not an object".to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            normalize_rows(&rows)
        }
        Value::Object(_) => normalize_collection(value),
        other => Err(IngestionFormatError::NotAFeatureCollection {
            found: json_kind(other).to_string(),
        }),
    }
}

/// Normalizes one feature collection.
pub fn normalize_collection(value: &Value) -> Result<IngestReport, IngestionFormatError> {
    let features = collection_features(value)?;
    let inputs = features
        .iter()
        .enumerate()
        .map(|(i, f)| (FeatureId::Int(i as i64 + 1), f))
        .collect::<Vec<_>>();
    Ok(normalize_features(&inputs))
}

/// Flattens several feature collections into one document.
///
/// Layers that are not feature collections are skipped; at least one layer
/// must be one.
pub fn normalize_layers(layers: &[Value]) -> Result<IngestReport, IngestionFormatError> {
    let mut inputs = Vec::new();
    let mut usable = 0;
    for (layer, value) in layers.iter().enumerate() {
        match collection_features(value) {
            Ok(features) => {
                usable += 1;
                for (i, feature) in features.iter().enumerate() {
                    let fallback = FeatureId::Str(format!("{}_{}", layer + 1, i + 1));
                    inputs.push((fallback, feature));
                }
            }
            Err(e) => tracing::warn!("Skipping layer {}: {}", layer + 1, e),
        }
    }
    if usable == 0 {
        return Err(IngestionFormatError::MissingFeatures);
    }
    Ok(normalize_features(&inputs))
}

/// Normalizes table rows.
pub fn normalize_rows(rows: &[Row]) -> Result<IngestReport, IngestionFormatError> {
    if rows.is_empty() {
        return Err(IngestionFormatError::Empty);
    }

    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let source = match (
        find_column(&columns, &LATITUDE_KEYS),
        find_column(&columns, &LONGITUDE_KEYS),
        find_column(&columns, &WKT_KEYS),
    ) {
        (Some(lat), Some(lon), _) => GeometrySource::LatLon { lat, lon },
        (_, _, Some(column)) => GeometrySource::Wkt { column },
        _ => {
            return Err(IngestionFormatError::NoGeometryField {
                columns: columns.join(", "),
            })
        }
    };

    let mut ids = IdAllocator::new(
        rows.iter().filter_map(|row| row.get(ID_PROPERTY).and_then(FeatureId::from_json)),
        rows.len(),
    );
    let mut features = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let geometry = match source.read(row) {
            Ok(g) => g,
            Err(reason) => {
                dropped.push(DroppedRow { index, reason });
                continue;
            }
        };

        let mut properties: Properties = row
            .iter()
            .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
            .collect();
        if let GeometrySource::Wkt { column } = &source {
            properties.remove(*column);
        }

        let explicit = row.get(ID_PROPERTY).and_then(FeatureId::from_json);
        let id = ids.claim(explicit, FeatureId::Int(index as i64 + 1));
        features.push(CanonicalFeature::new(id, Some(geometry), properties));
    }

    Ok(IngestReport {
        document: CanonicalDocument::new(features),
        dropped,
    })
}

enum GeometrySource<'a> {
    LatLon { lat: &'a str, lon: &'a str },
    Wkt { column: &'a str },
}

impl GeometrySource<'_> {
    fn read(&self, row: &Row) -> Result<Geometry, String> {
        match self {
            GeometrySource::LatLon { lat, lon } => {
                let lat_value = number_cell(row.get(*lat)).ok_or_else(|| format!("missing or invalid {}", lat))?;
                let lon_value = number_cell(row.get(*lon)).ok_or_else(|| format!("missing or invalid {}", lon))?;
                if lat_value.abs() > 90.0 || lon_value.abs() > 180.0 {
                    return Err(format!(
                        "coordinate ({}, {}) out of range",
                        lon_value, lat_value
                    ));
                }
                Ok(Geometry::Point(Coord(lon_value, lat_value)))
            }
            GeometrySource::Wkt { column } => match row.get(*column) {
                Some(Value::String(text)) if !text.trim().is_empty() => {
                    parse_wkt(text).map_err(|e| e.to_string())
                }
                _ => Err(format!("missing {}", column)),
            },
        }
    }
}

fn number_cell(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn find_column<'a>(columns: &[&'a str], candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(candidate))
            .copied()
    })
}

fn collection_features(value: &Value) -> Result<&Vec<Value>, IngestionFormatError> {
    let object = value
        .as_object()
        .ok_or_else(|| IngestionFormatError::NotAFeatureCollection {
            found: json_kind(value).to_string(),
        })?;

    match object.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") | None => {}
        Some(other) => {
            return Err(IngestionFormatError::NotAFeatureCollection {
                found: other.to_string(),
            })
        }
    }

    object
        .get("features")
        .and_then(Value::as_array)
        .ok_or(IngestionFormatError::MissingFeatures)
}

fn normalize_features(inputs: &[(FeatureId, &Value)]) -> IngestReport {
    let mut ids = IdAllocator::new(
        inputs.iter().filter_map(|(_, f)| explicit_feature_id(f)),
        inputs.len(),
    );
    let mut features = Vec::with_capacity(inputs.len());
    let mut dropped = Vec::new();

    for (index, (fallback, value)) in inputs.iter().enumerate() {
        let Some(object) = value.as_object() else {
            dropped.push(DroppedRow {
                index,
                reason: "feature is not an object".to_string(),
            });
            continue;
        };

        let geometry = match object.get("geometry") {
            None | Some(Value::Null) => None,
            Some(g) => match parse_geometry(g) {
                Ok(g) => Some(g),
                Err(reason) => {
                    dropped.push(DroppedRow { index, reason });
                    continue;
                }
            },
        };

        let id = ids.claim(explicit_feature_id(value), fallback.clone());

        let source_properties = object.get("properties").and_then(Value::as_object);
        let properties: Properties = match source_properties {
            Some(map) if !map.is_empty() => map
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                .collect(),
            _ => synthetic_properties(geometry.as_ref()),
        };

        features.push(CanonicalFeature::new(id, geometry, properties));
    }

    IngestReport {
        document: CanonicalDocument::new(features),
        dropped,
    }
}

fn explicit_feature_id(feature: &Value) -> Option<FeatureId> {
    feature
        .get("id")
        .and_then(FeatureId::from_json)
        .or_else(|| {
            feature
                .get("properties")
                .and_then(|p| p.get(ID_PROPERTY))
                .and_then(FeatureId::from_json)
        })
}

fn synthetic_properties(geometry: Option<&Geometry>) -> Properties {
    let mut properties = Properties::new();
    let kind = geometry
        .map(|g| PropertyValue::from(g.kind().as_str()))
        .unwrap_or(PropertyValue::Null);
    properties.insert(GEOMETRY_TYPE_PROPERTY.to_string(), kind);
    properties
}

/// Reads a GeoJSON geometry object. Extra ordinates are dropped.
pub fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let kind_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "geometry has no type".to_string())?;
    let kind: GeometryKind = kind_name.parse()?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| format!("{} has no coordinates", kind))?;
    CoordinateTree::from_json_lenient(coordinates)
        .and_then(|tree| tree.into_geometry(kind))
        .map_err(|e| e.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Hands out unique ids: explicit ids win, fallbacks that collide with any
/// explicit id are replaced by the next unused integer. The search wraps
/// around to 1 past `i64::MAX`.
struct IdAllocator {
    reserved: HashSet<FeatureId>,
    claimed: HashSet<FeatureId>,
    next: i64,
}

impl IdAllocator {
    fn new(explicit: impl Iterator<Item = FeatureId>, count: usize) -> Self {
        let reserved: HashSet<FeatureId> = explicit.collect();
        let max_explicit = reserved.iter().filter_map(FeatureId::as_int).max().unwrap_or(0);
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self {
            reserved,
            claimed: HashSet::new(),
            next: max_explicit.max(count).checked_add(1).unwrap_or(1),
        }
    }

    fn claim(&mut self, explicit: Option<FeatureId>, fallback: FeatureId) -> FeatureId {
        match explicit {
            Some(id) => {
                if self.claimed.insert(id.clone()) {
                    return id;
                }
            }
            None => {
                if !self.reserved.contains(&fallback) && self.claimed.insert(fallback.clone()) {
                    return fallback;
                }
            }
        }
        loop {
            let id = FeatureId::Int(self.next);
            self.next = self.next.checked_add(1).unwrap_or(1);
            if !self.reserved.contains(&id) && self.claimed.insert(id.clone()) {
                return id;
            }
        }
    }
}
