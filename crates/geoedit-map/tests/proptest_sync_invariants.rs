//! Property-based invariant tests for coordinate transcoding and map sync.
//!
//! 1. Geographic -> projected -> geographic is the identity within 1e-9 degrees.
//! 2. Transcoding keeps the geometry kind and vertex count.
//! 3. After any sequence of replacements the mirror ids equal the document ids.
//! 4. The selection is always empty or a feature of the current document.

use geoedit_core::{Coord, FeatureId, Geometry};
use geoedit_map::transcode::{to_geographic, to_projected, transcode, Direction};
use geoedit_map::{EditorSession, HeadlessEngine, IngestInput};
use geoedit_settings::Config;
use proptest::prelude::*;
use serde_json::{json, Value};

// ── Helpers ─────────────────────────────────────────────────────────────

fn lon_lat() -> impl Strategy<Value = Coord> {
    (-180.0f64..=180.0, -85.0f64..=85.0).prop_map(|(lon, lat)| Coord(lon, lat))
}

fn line() -> impl Strategy<Value = Geometry> {
    proptest::collection::vec(lon_lat(), 2..20).prop_map(Geometry::LineString)
}

fn collection(ids: &[u8]) -> Value {
    let features: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "type": "Feature",
                "id": *id as i64,
                "geometry": { "type": "Point", "coordinates": [*id as f64 / 2.0, 10.0] },
                "properties": {}
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

fn id_sets() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(
        proptest::collection::btree_set(0u8..40, 0..12).prop_map(|s| s.into_iter().collect()),
        1..6,
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Transcoding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn round_trip_is_identity(c in lon_lat()) {
        let back = to_geographic(to_projected(c));
        prop_assert!(
            back.approx_eq(&c, 1e-9),
            "{:?} came back as {:?}", c, back
        );
    }

    #[test]
    fn transcode_keeps_shape(geometry in line()) {
        let projected = transcode(&geometry, Direction::ToProjected);
        prop_assert_eq!(projected.kind(), geometry.kind());
        match (&projected, &geometry) {
            (Geometry::LineString(a), Geometry::LineString(b)) => prop_assert_eq!(a.len(), b.len()),
            _ => prop_assert!(false, "kind changed"),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3-4. Sync
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mirrors_track_document(sets in id_sets(), pick in 0u8..40) {
        let mut session = EditorSession::new(HeadlessEngine::new(800.0, 600.0), Config::default());

        for ids in &sets {
            session.select(Some(FeatureId::Int(pick as i64)));
            session.ingest(IngestInput::Json(collection(ids))).unwrap();

            let document = session.document();
            prop_assert_eq!(session.bridge().mirror_ids(), document.ids());

            let mut on_map = session.engine().feature_ids().to_vec();
            let mut expected = document.ids();
            on_map.sort_by_key(|id| id.to_string());
            expected.sort_by_key(|id| id.to_string());
            prop_assert_eq!(on_map, expected);

            if let Some(selected) = session.selected() {
                prop_assert!(document.contains(selected));
            }
        }
    }
}
