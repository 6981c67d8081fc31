use geoedit_core::{
    Coord, EditField, FeatureId, Geometry, GeometryKind, InteractionMode, PropertyValue,
};
use geoedit_map::transcode::{to_projected, transcode, Direction};
use geoedit_map::{
    ClickOutcome, EditorSession, EngineCall, HeadlessEngine, IngestInput, IngestOutcome, Pixel,
};
use geoedit_settings::Config;
use serde_json::{json, Value};
use parking_lot::Mutex;
use std::sync::Arc;

fn session() -> EditorSession<HeadlessEngine> {
    EditorSession::new(HeadlessEngine::new(800.0, 600.0), Config::default())
}

fn load(session: &mut EditorSession<HeadlessEngine>, collection: Value) {
    session
        .ingest(IngestInput::Json(collection))
        .expect("collection should ingest");
}

fn point_feature(id: i64, lon: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "geometry": { "type": "Point", "coordinates": [lon, lat] },
        "properties": { "name": format!("feature {}", id) }
    })
}

fn square(lon: f64, lat: f64, size: f64) -> Geometry {
    Geometry::Polygon(vec![vec![
        Coord(lon, lat),
        Coord(lon + size, lat),
        Coord(lon + size, lat + size),
        Coord(lon, lat + size),
        Coord(lon, lat),
    ]])
}

fn point_of(session: &EditorSession<HeadlessEngine>, id: i64) -> Coord {
    match session
        .document()
        .get(&FeatureId::Int(id))
        .and_then(|f| f.geometry.clone())
    {
        Some(Geometry::Point(c)) => c,
        other => panic!("feature {} is not a point: {:?}", id, other),
    }
}

#[test]
fn test_move_point_to_clicked_location() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(7, 0.0, 0.0)] }),
    );

    session.start_move(&FeatureId::Int(7)).unwrap();
    assert_eq!(
        session.mode(),
        &InteractionMode::Moving {
            id: FeatureId::Int(7)
        }
    );

    let pixel = session
        .engine()
        .coordinate_to_pixel(to_projected(Coord(10.0, 20.0)));
    let outcome = session.handle_map_click(pixel).unwrap();

    assert_eq!(outcome, ClickOutcome::Moved(FeatureId::Int(7)));
    assert!(
        point_of(&session, 7).approx_eq(&Coord(10.0, 20.0), 1e-9),
        "moved to {:?}",
        point_of(&session, 7)
    );
    assert!(session.mode().is_idle());
}

#[test]
fn test_move_updates_existing_coordinate_columns() {
    let mut session = session();
    session
        .ingest(IngestInput::Rows(vec![json!({
            "name": "A", "latitude": 40.1, "longitude": 47.5
        })
        .as_object()
        .cloned()
        .unwrap()]))
        .unwrap();

    session.start_move(&FeatureId::Int(1)).unwrap();
    let pixel = session
        .engine()
        .coordinate_to_pixel(to_projected(Coord(48.0, 41.0)));
    session.handle_map_click(pixel).unwrap();

    let document = session.document();
    let feature = document.get(&FeatureId::Int(1)).unwrap();
    let lon = feature.property("longitude").and_then(PropertyValue::as_f64).unwrap();
    let lat = feature.property("latitude").and_then(PropertyValue::as_f64).unwrap();
    assert!((lon - 48.0).abs() < 1e-9);
    assert!((lat - 41.0).abs() < 1e-9);
}

#[test]
fn test_move_rejected_for_non_point_keeps_mode() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "id": 3,
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
            "properties": { "name": "road" }
        }]}),
    );

    let token = session.start_add(GeometryKind::Point);
    let err = session.start_move(&FeatureId::Int(3)).unwrap_err();

    assert!(err.is_unsupported_operation());
    assert_eq!(
        session.mode(),
        &InteractionMode::Adding {
            kind: GeometryKind::Point
        }
    );
    assert_eq!(session.bridge().active_gesture(), Some(token));
}

#[test]
fn test_clear_while_adding_returns_to_idle() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );
    session.select(Some(FeatureId::Int(1)));
    session.start_add(GeometryKind::Polygon);
    assert_eq!(session.engine().gestures().len(), 1);

    session.clear();

    assert!(session.mode().is_idle());
    assert!(session.engine().gestures().is_empty());
    assert_eq!(session.bridge().active_gesture(), None);
    assert_eq!(session.selected(), None);
    assert!(session.document().is_empty());
    assert!(session.engine().feature_ids().is_empty());
}

#[test]
fn test_geometry_update_refits_once_with_new_geometry() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "id": 1,
            "geometry": serde_json::to_value(square(47.0, 40.0, 0.01)).unwrap(),
            "properties": { "name": "field" }
        }]}),
    );
    session.select(Some(FeatureId::Int(1)));
    session.engine_mut().clear_calls();

    let updated = square(49.0, 41.0, 0.02);
    session
        .update_geometry(&FeatureId::Int(1), updated.clone())
        .unwrap();

    let expected = transcode(&updated, Direction::ToProjected).extent().unwrap();
    let camera = session.engine().camera_calls();
    assert_eq!(camera.len(), 1, "camera calls: {:?}", camera);
    match camera[0] {
        EngineCall::FitView { extent, options } => {
            assert_eq!(*extent, expected);
            assert_eq!(options.padding_px, 50.0);
            assert_eq!(options.max_zoom, 16.0);
        }
        other => panic!("expected a fit, got {:?}", other),
    }
}

#[test]
fn test_idle_click_selects_and_clears() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    let on_point = session
        .engine()
        .coordinate_to_pixel(to_projected(Coord(47.5, 40.1)));
    assert_eq!(
        session.handle_map_click(on_point).unwrap(),
        ClickOutcome::Selected(Some(FeatureId::Int(1)))
    );
    assert_eq!(session.engine().style(&FeatureId::Int(1)).unwrap().stroke, "red");

    let away = Pixel::new(on_point.x + 300.0, on_point.y + 200.0);
    assert_eq!(
        session.handle_map_click(away).unwrap(),
        ClickOutcome::Selected(None)
    );
    assert_eq!(session.selected(), None);
    assert_eq!(session.engine().style(&FeatureId::Int(1)).unwrap().stroke, "blue");
}

#[test]
fn test_draw_completion_adds_named_and_selected_feature() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    let token = session.start_add(GeometryKind::Polygon);
    let drawn = transcode(&square(47.6, 40.2, 0.05), Direction::ToProjected);
    let id = session.handle_draw_complete(token, drawn).unwrap();

    assert_eq!(id, Some(FeatureId::Int(2)));
    let document = session.document();
    let feature = document.get(&FeatureId::Int(2)).unwrap();
    assert_eq!(
        feature.property("name"),
        Some(&PropertyValue::from("New Polygon 2"))
    );
    assert_eq!(feature.property("id"), Some(&PropertyValue::from(2i64)));
    assert_eq!(feature.geometry_kind(), Some(GeometryKind::Polygon));

    assert!(session.mode().is_idle());
    assert_eq!(session.selected(), Some(&FeatureId::Int(2)));
    assert!(session.engine().gestures().is_empty());
    assert_eq!(session.engine().style(&FeatureId::Int(2)).unwrap().stroke, "red");
}

#[test]
fn test_draw_completion_of_wrong_kind_cancels_add() {
    let mut session = session();
    let token = session.start_add(GeometryKind::Polygon);

    let err = session
        .handle_draw_complete(token, Geometry::Point(Coord(0.0, 0.0)))
        .unwrap_err();

    assert!(err.is_unsupported_operation());
    assert!(session.mode().is_idle());
    assert!(session.document().is_empty());
}

#[test]
fn test_stale_draw_completion_is_discarded() {
    let mut session = session();
    let stale = session.start_add(GeometryKind::Point);
    session.cancel_add();
    let current = session.start_add(GeometryKind::Point);
    assert_ne!(stale, current);

    let result = session
        .handle_draw_complete(stale, Geometry::Point(Coord(0.0, 0.0)))
        .unwrap();

    assert_eq!(result, None);
    assert!(session.document().is_empty());
    assert_eq!(
        session.mode(),
        &InteractionMode::Adding {
            kind: GeometryKind::Point
        }
    );
    assert_eq!(session.engine().gestures().len(), 1);
}

#[test]
fn test_switching_modes_keeps_one_gesture_listener() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    session.start_add(GeometryKind::LineString);
    session
        .begin_edit(&FeatureId::Int(1), EditField::Geometry)
        .unwrap();
    assert_eq!(session.engine().gestures().len(), 1);

    session.start_add(GeometryKind::Point);
    assert_eq!(session.engine().gestures().len(), 1);

    session.start_move(&FeatureId::Int(1)).unwrap();
    assert!(session.engine().gestures().is_empty());
}

#[test]
fn test_commit_property_edit_keeps_number_type() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "id": 1,
            "geometry": { "type": "Point", "coordinates": [47.5, 40.1] },
            "properties": { "population": 100, "name": "Ganja" }
        }]}),
    );

    session
        .begin_edit(&FeatureId::Int(1), EditField::Property("population".into()))
        .unwrap();
    session.stage_edit("250").unwrap();
    session.commit_edit().unwrap();

    let document = session.document();
    assert_eq!(
        document.get(&FeatureId::Int(1)).unwrap().property("population"),
        Some(&PropertyValue::from(250i64))
    );
    assert!(session.mode().is_idle());
}

#[test]
fn test_cancel_edit_discards_staged_text() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    session
        .begin_edit(&FeatureId::Int(1), EditField::Property("name".into()))
        .unwrap();
    session.stage_edit("renamed").unwrap();
    assert!(session.cancel_edit());

    let document = session.document();
    assert_eq!(
        document.get(&FeatureId::Int(1)).unwrap().property("name"),
        Some(&PropertyValue::from("feature 1"))
    );
    assert!(session.commit_edit().unwrap_err().is_document_error());
}

#[test]
fn test_rejected_coordinate_text_keeps_geometry_and_mode() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    session
        .begin_edit(&FeatureId::Int(1), EditField::Geometry)
        .unwrap();
    session.stage_edit("[200, 10]").unwrap();
    let err = session.commit_edit().unwrap_err();

    assert!(err.is_coordinate_error());
    assert_eq!(point_of(&session, 1), Coord(47.5, 40.1));
    assert_eq!(session.mode().name(), "Editing");

    session.stage_edit("[48.0, 41.0]").unwrap();
    session.commit_edit().unwrap();
    assert_eq!(point_of(&session, 1), Coord(48.0, 41.0));
    assert!(session.mode().is_idle());
    assert!(session.engine().gestures().is_empty());
}

#[test]
fn test_geometry_text_round_trip() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "id": 5,
            "geometry": { "type": "LineString", "coordinates": [[47.0, 40.0], [48.0, 41.0]] },
            "properties": { "name": "road" }
        }]}),
    );

    let text = session.geometry_text(&FeatureId::Int(5)).unwrap();
    assert!(text.contains('\n'), "expected pretty text: {}", text);

    let bad = session.update_geometry_from_text(&FeatureId::Int(5), "[47.0, 40.0]");
    assert!(bad.unwrap_err().is_coordinate_error());

    session
        .update_geometry_from_text(&FeatureId::Int(5), "[[47.0, 40.0], [49.0, 42.0]]")
        .unwrap();
    assert_eq!(
        session.document().get(&FeatureId::Int(5)).unwrap().geometry,
        Some(Geometry::LineString(vec![Coord(47.0, 40.0), Coord(49.0, 42.0)]))
    );
}

#[test]
fn test_modify_completion_writes_geometry_back() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "id": 2,
            "geometry": { "type": "LineString", "coordinates": [[47.0, 40.0], [48.0, 41.0]] },
            "properties": { "name": "road" }
        }]}),
    );
    session
        .begin_edit(&FeatureId::Int(2), EditField::Geometry)
        .unwrap();
    let token = session.bridge().active_gesture().unwrap();

    let reshaped = Geometry::LineString(vec![Coord(47.0, 40.0), Coord(47.5, 40.5)]);
    let applied = session
        .handle_modify_complete(token, transcode(&reshaped, Direction::ToProjected))
        .unwrap();

    assert!(applied);
    assert!(session.mode().is_idle());
    match session.document().get(&FeatureId::Int(2)).unwrap().geometry.clone() {
        Some(Geometry::LineString(coords)) => {
            assert!(coords[1].approx_eq(&Coord(47.5, 40.5), 1e-9));
        }
        other => panic!("expected a line, got {:?}", other),
    }
}

#[test]
fn test_id_property_is_read_only() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );
    let err = session
        .update_property(&FeatureId::Int(1), "id", PropertyValue::from(9i64))
        .unwrap_err();
    assert!(err.is_document_error());
    assert_eq!(
        session.document().get(&FeatureId::Int(1)).unwrap().property("id"),
        Some(&PropertyValue::from(1i64))
    );
}

#[test]
fn test_stale_ingestion_result_is_discarded() {
    let mut session = session();
    let older = session.begin_ingest();
    let newer = session.begin_ingest();

    let applied = session
        .apply_ingest(
            newer,
            IngestInput::Json(json!({ "type": "FeatureCollection", "features": [
                point_feature(1, 47.5, 40.1),
                point_feature(2, 47.6, 40.2)
            ]})),
        )
        .unwrap();
    assert_eq!(
        applied,
        IngestOutcome::Applied {
            features: 2,
            dropped: 0
        }
    );

    let late = session
        .apply_ingest(
            older,
            IngestInput::Json(json!({ "type": "FeatureCollection", "features": [
                point_feature(9, 0.0, 0.0)
            ]})),
        )
        .unwrap();
    assert_eq!(
        late,
        IngestOutcome::Discarded {
            current: newer.sequence()
        }
    );
    assert_eq!(session.document().len(), 2);
}

#[test]
fn test_failed_ingestion_leaves_document_unchanged() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );
    let revision = session.revision();

    let err = session
        .ingest(IngestInput::Json(json!({ "type": "FeatureCollection" })))
        .unwrap_err();

    assert!(err.is_ingestion_error());
    assert_eq!(session.document().len(), 1);
    assert_eq!(session.revision(), revision);
}

#[test]
fn test_replace_drops_vanished_selection() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );
    session.select(Some(FeatureId::Int(1)));

    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(2, 47.5, 40.1)] }),
    );
    assert_eq!(session.selected(), None);
}

#[test]
fn test_selection_listeners_see_every_change() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [
            point_feature(1, 47.5, 40.1),
            point_feature(2, 47.6, 40.2)
        ]}),
    );
    let seen: Arc<Mutex<Vec<Option<FeatureId>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.on_selection_change(move |id| sink.lock().push(id.cloned()));

    session.select(Some(FeatureId::Int(1)));
    session.select(Some(FeatureId::Int(1)));
    session.select(Some(FeatureId::Int(42)));

    assert_eq!(
        *seen.lock(),
        vec![Some(FeatureId::Int(1)), None]
    );
}

#[test]
fn test_unready_engine_receives_queued_work() {
    let mut session = EditorSession::new(HeadlessEngine::unready(), Config::default());
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [
            point_feature(1, 47.5, 40.1),
            point_feature(2, 47.6, 40.2)
        ]}),
    );
    let token = session.start_add(GeometryKind::Point);
    assert!(session.engine().calls().is_empty());
    assert!(!session.on_engine_ready());

    session.engine_mut().resize(800.0, 600.0);
    assert!(session.on_engine_ready());

    let engine = session.engine();
    assert!(engine.layer_created());
    assert_eq!(
        engine.feature_ids(),
        &[FeatureId::Int(1), FeatureId::Int(2)]
    );
    assert_eq!(engine.gestures().len(), 1);
    assert_eq!(engine.gestures()[0].0, token);
    assert!(matches!(
        engine.camera_calls().as_slice(),
        [EngineCall::FitView { .. }]
    ));
}

#[test]
fn test_export_is_standalone_geojson() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(1, 47.5, 40.1)] }),
    );

    let text = session.export_document().unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"][0]["type"], "Feature");
    assert_eq!(value["features"][0]["geometry"]["type"], "Point");
    assert_eq!(value["features"][0]["properties"]["id"], 1);
}

#[test]
fn test_upsert_feature_reaches_map_with_mirrored_id() {
    let mut session = session();
    let mut properties = geoedit_core::Properties::new();
    properties.insert("name".to_string(), PropertyValue::from("depot"));

    session
        .upsert_feature(geoedit_core::CanonicalFeature::new(
            FeatureId::Int(10),
            Some(Geometry::Point(Coord(47.5, 40.1))),
            properties.clone(),
        ))
        .unwrap();

    let document = session.document();
    assert_eq!(
        document.get(&FeatureId::Int(10)).unwrap().property("id"),
        Some(&PropertyValue::from(10i64))
    );
    assert_eq!(session.engine().feature_ids(), &[FeatureId::Int(10)]);

    let err = session
        .upsert_feature(geoedit_core::CanonicalFeature::new(
            FeatureId::Int(11),
            Some(Geometry::Point(Coord(250.0, 40.1))),
            properties,
        ))
        .unwrap_err();
    assert!(err.is_coordinate_error());
    assert_eq!(session.document().len(), 1);
}

#[test]
fn test_moving_ends_when_target_stops_being_a_point() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(7, 0.0, 0.0)] }),
    );
    session.start_move(&FeatureId::Int(7)).unwrap();

    let line = Geometry::LineString(vec![Coord(1.0, 1.0), Coord(2.0, 2.0)]);
    session
        .update_geometry(&FeatureId::Int(7), line.clone())
        .unwrap();
    assert_eq!(session.mode(), &InteractionMode::Idle, "Moving must not outlive the Point");

    let pixel = session
        .engine()
        .coordinate_to_pixel(to_projected(Coord(10.0, 20.0)));
    session.handle_map_click(pixel).unwrap();

    assert_eq!(
        session
            .document()
            .get(&FeatureId::Int(7))
            .and_then(|f| f.geometry.clone()),
        Some(line),
        "The click must not turn the LineString back into a Point"
    );
}

#[test]
fn test_moving_ends_when_replace_changes_target_kind() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(7, 0.0, 0.0)] }),
    );
    session.start_move(&FeatureId::Int(7)).unwrap();

    load(
        &mut session,
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": 7,
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": {}
            }]
        }),
    );
    assert_eq!(session.mode(), &InteractionMode::Idle);
}

#[test]
fn test_moving_survives_edits_that_keep_a_point() {
    let mut session = session();
    load(
        &mut session,
        json!({ "type": "FeatureCollection", "features": [point_feature(7, 0.0, 0.0)] }),
    );
    session.start_move(&FeatureId::Int(7)).unwrap();

    session
        .update_property(&FeatureId::Int(7), "name", PropertyValue::from("renamed"))
        .unwrap();
    session
        .update_geometry(&FeatureId::Int(7), Geometry::Point(Coord(3.0, 3.0)))
        .unwrap();

    assert_eq!(
        session.mode(),
        &InteractionMode::Moving {
            id: FeatureId::Int(7)
        }
    );
}

#[test]
fn test_draw_completion_reports_exhausted_ids() {
    let mut session = session();
    load(
        &mut session,
        json!({
            "type": "FeatureCollection",
            "features": [point_feature(i64::MAX, 1.0, 1.0)]
        }),
    );

    let token = session.start_add(GeometryKind::Point);
    let err = session
        .handle_draw_complete(token, Geometry::Point(to_projected(Coord(5.0, 5.0))))
        .unwrap_err();

    assert!(err.is_document_error());
    assert_eq!(session.mode(), &InteractionMode::Idle);
    assert_eq!(session.document().len(), 1);
    assert_eq!(point_of(&session, i64::MAX), Coord(1.0, 1.0));
}
