//! Integration tests for the annotation subsystem.
//!
//! Exercises eva-core types flowing through the eva-annotation store, its
//! log files, settings and export, with video geometry from eva-media.

use eva_annotation::{
    AnnotationStore, AutoFillStrategy, ExportLayout, FixKind, LoadedLog, LogFile, LogVersion,
    SampleExport, Settings, SlotState,
};
use eva_core::{
    Direction, EvaError, FrameSize, InstrumentName, KeyframeSchedule, Point, PromptAnnotation,
    StatusTag,
};
use eva_media::{VideoInfo, VideoSource};

// ── Helpers ────────────────────────────────────────────────────

fn video() -> VideoInfo {
    VideoInfo {
        frame_count: 95,
        frame_size: FrameSize::new(640, 480),
        fps: 30.0,
    }
}

fn empty_store() -> AnnotationStore {
    let info = video();
    AnnotationStore::new(info.keyframe_schedule(30), info.frame_size())
}

fn clear_tissue() -> PromptAnnotation {
    PromptAnnotation::tissue([StatusTag::ClearView])
}

fn forceps(order: u32, status: StatusTag) -> PromptAnnotation {
    PromptAnnotation::instrument(order, 1, InstrumentName::CadiereForceps, status)
}

/// Keyframe 0 labeled with a tissue point and an instrument point.
fn annotated_store() -> AnnotationStore {
    let mut store = empty_store();
    store.set_point(0, 0, Point::new(10, 10)).unwrap();
    store.set_prompt(0, 0, Some(clear_tissue())).unwrap();
    store.append(0).unwrap();
    store.set_point(0, 1, Point::new(20, 20)).unwrap();
    store
        .set_prompt(0, 1, Some(forceps(1, StatusTag::ClearView)))
        .unwrap();
    store
}

// ── Opening and schedule ───────────────────────────────────────

#[test]
fn probed_schedule_seeds_one_vacant_slot_per_keyframe() {
    let store = empty_store();
    assert_eq!(store.schedule().as_slice(), &[0, 30, 60, 90, 94]);
    for keyframe in store.keyframes() {
        assert_eq!(store.slot_states(keyframe).unwrap(), vec![SlotState::Vacant]);
    }
}

#[test]
fn missing_log_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = LogFile::load(&dir.path().join("absent.json"));
    assert_eq!(loaded, LoadedLog::Missing);

    let store = AnnotationStore::open(
        KeyframeSchedule::from_frame_count(61),
        FrameSize::new(640, 480),
        loaded,
    );
    assert_eq!(store.slot_count(30).unwrap(), 1);
}

#[test]
fn corrupt_log_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let loaded = LogFile::load(&path);
    assert!(matches!(loaded, LoadedLog::Corrupt { .. }));
    let store = AnnotationStore::open(
        KeyframeSchedule::from_frame_count(61),
        FrameSize::new(640, 480),
        loaded,
    );
    assert_eq!(store.points(0).unwrap(), vec![None]);
}

#[test]
fn legacy_history_is_rescaled_to_frame_pixels() {
    let (version, log) = LogFile::from_json(br#"{"history": {"0": [[100, 100], null]}}"#).unwrap();
    assert_eq!(version, LogVersion::Legacy);

    let store = AnnotationStore::open_with_legacy_scale(
        KeyframeSchedule::from_frame_count(31),
        FrameSize::new(640, 480),
        LoadedLog::Parsed { version, log },
        0.5,
    )
    .unwrap();
    assert_eq!(store.points(0).unwrap(), vec![Some(Point::new(200, 200)), None]);
    assert_eq!(store.prompts(0).unwrap(), vec![None, None]);
}

#[test]
fn fractional_legacy_points_are_scaled_before_flooring() {
    let (version, log) =
        LogFile::from_json(br#"{"history": {"0": [[100.9, 50.75]]}}"#).unwrap();
    let store = AnnotationStore::open_with_legacy_scale(
        KeyframeSchedule::from_frame_count(31),
        FrameSize::new(640, 480),
        LoadedLog::Parsed { version, log },
        0.5,
    )
    .unwrap();
    assert_eq!(store.points(0).unwrap(), vec![Some(Point::new(201, 101))]);
}

#[test]
fn current_log_is_not_rescaled() {
    let (version, log) = LogFile::from_json(
        br#"{"Tracking_Annotation": {"0": [[100, 100]]},
             "Text_Annotation": {"0": [{"location": "Tissue", "status": ["Smoke Obscuration"]}]}}"#,
    )
    .unwrap();
    assert_eq!(version, LogVersion::Current);

    let store = AnnotationStore::open_with_legacy_scale(
        KeyframeSchedule::from_frame_count(31),
        FrameSize::new(640, 480),
        LoadedLog::Parsed { version, log },
        0.5,
    )
    .unwrap();
    assert_eq!(store.points(0).unwrap(), vec![Some(Point::new(100, 100))]);
    assert_eq!(
        store.prompt(0, 0),
        Some(&PromptAnnotation::tissue([StatusTag::SmokeObscuration]))
    );
}

// ── Save and reload ────────────────────────────────────────────

#[test]
fn saved_store_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("clip.json");

    let mut store = annotated_store();
    store.auto_fill(30, AutoFillStrategy::FromFirstFrame).unwrap();
    store.cancel(30, 1).unwrap();
    LogFile::save(&path, &store).unwrap();

    let reopened = AnnotationStore::open(
        store.schedule().clone(),
        store.frame_size(),
        LogFile::load(&path),
    );
    assert_eq!(reopened.point_track(), store.point_track());
    assert_eq!(reopened.prompt_track(), store.prompt_track());
    assert_eq!(
        reopened.slot_states(30).unwrap(),
        vec![SlotState::Labeled, SlotState::Vacant]
    );
}

#[test]
fn saved_log_uses_current_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.json");
    LogFile::save(&path, &annotated_store()).unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["Tracking_Annotation"]["0"][1], serde_json::json!([20, 20]));
    assert_eq!(raw["Text_Annotation"]["0"][0]["location"], "Tissue");
    assert_eq!(raw["Text_Annotation"]["30"][0], serde_json::Value::Null);
    assert!(raw.get("history").is_none());
}

// ── Fill and fix ───────────────────────────────────────────────

#[test]
fn trims_extra_points_against_reference() {
    let mut store = empty_store();
    store.set_point(0, 0, Point::new(10, 10)).unwrap();
    store.set_prompt(0, 0, Some(clear_tissue())).unwrap();
    store.append(0).unwrap();
    store.set_point(0, 1, Point::new(20, 20)).unwrap();
    for _ in 0..2 {
        store.append(30).unwrap();
    }
    assert_eq!(store.slot_count(30).unwrap(), 3);

    let records = store.auto_fix(30).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, FixKind::RemovePoint);
    assert_eq!(records[0].title(), "[Point num fix]Frame30:");
    assert_eq!(records[0].content(), "remove a point");
    assert_eq!(store.slot_count(30).unwrap(), 2);
}

#[test]
fn filled_keyframe_needs_no_fix() {
    let mut store = annotated_store();
    assert!(store.auto_fill(60, AutoFillStrategy::FromFirstFrame).unwrap());
    assert!(store.auto_fix(60).unwrap().is_empty());
    assert_eq!(store.slots(60).unwrap(), store.slots(0).unwrap());
}

#[test]
fn fill_from_previous_chains_edits() {
    let mut store = annotated_store();
    store.auto_fill(30, AutoFillStrategy::FromFirstFrame).unwrap();
    store.fix_point(30, 0, Direction::Right, 5).unwrap();
    store.auto_fill(60, AutoFillStrategy::FromPreviousFrame).unwrap();
    assert_eq!(store.points(60).unwrap()[0], Some(Point::new(15, 10)));
}

#[test]
fn fix_restores_reference_shape_and_keeps_local_status() {
    let mut store = annotated_store();
    store.auto_fill(90, AutoFillStrategy::FromFirstFrame).unwrap();
    store
        .set_prompt(90, 1, Some(forceps(2, StatusTag::SelfOcclusion)))
        .unwrap();

    let records = store.auto_fix(90).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title(), "[Prompt fix]Frame90/Point1:");
    assert_eq!(records[0].content(), "Modify[instrument_order][2]->[1]");
    assert_eq!(
        store.prompt(90, 1),
        Some(&forceps(1, StatusTag::SelfOcclusion))
    );
    assert!(store.auto_fix(90).unwrap().is_empty());
}

#[test]
fn fix_all_covers_every_keyframe_but_the_reference() {
    let mut store = annotated_store();
    for keyframe in [30, 60, 90, 94] {
        store.append(keyframe).unwrap();
        store.append(keyframe).unwrap();
    }
    let records = store.auto_fix_all().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.kind == FixKind::RemovePoint));
    assert_eq!(
        records.iter().map(|r| r.keyframe).collect::<Vec<_>>(),
        vec![30, 60, 90, 94]
    );
    assert_eq!(store.slot_count(0).unwrap(), 2);
}

// ── Editing ────────────────────────────────────────────────────

#[test]
fn delete_then_append_keeps_pairs_aligned() {
    let mut store = annotated_store();
    let removed = store.delete(0, 0).unwrap();
    assert_eq!(removed.prompt, Some(clear_tissue()));
    store.append(0).unwrap();

    assert_eq!(store.points(0).unwrap(), vec![Some(Point::new(20, 20)), None]);
    assert_eq!(
        store.prompts(0).unwrap(),
        vec![Some(forceps(1, StatusTag::ClearView)), None]
    );
}

#[test]
fn edits_outside_the_store_are_rejected() {
    let mut store = annotated_store();
    assert!(matches!(
        store.delete(0, 5),
        Err(EvaError::SlotOutOfRange { index: 5, len: 2, .. })
    ));
    assert!(matches!(
        store.set_point(7, 0, Point::new(1, 1)),
        Err(EvaError::KeyframeNotFound(7))
    ));
}

#[test]
fn nudging_clamps_to_the_frame() {
    let mut store = annotated_store();
    store.fix_point(0, 0, Direction::Up, 50).unwrap();
    store.fix_point(0, 1, Direction::Right, 10_000).unwrap();
    assert_eq!(store.points(0).unwrap()[0], Some(Point::new(10, 0)));
    assert_eq!(store.points(0).unwrap()[1], Some(Point::new(639, 20)));
}

#[test]
fn first_annotated_keyframe_follows_schedule() {
    let mut store = empty_store();
    store.set_point(60, 0, Point::new(3, 4)).unwrap();
    store.set_point(94, 0, Point::new(3, 4)).unwrap();
    assert_eq!(store.first_annotated_keyframe(0), Some(60));
    assert_eq!(store.first_annotated_keyframe(1), None);
}

// ── Settings and export ────────────────────────────────────────

#[test]
fn settings_drive_the_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        br#"{"auto_fill": "From previous frame", "keyframe_interval": 45}"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.auto_fill, AutoFillStrategy::FromPreviousFrame);
    assert!(!settings.simplify_annotation);
    let schedule = video().keyframe_schedule(settings.keyframe_interval);
    assert_eq!(schedule.as_slice(), &[0, 45, 90, 94]);
}

#[test]
fn export_writes_both_tracks_into_the_sample_layout() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExportLayout::new(3, "left", 7);
    let target = layout.segmentation_dir(dir.path());
    assert!(target.ends_with("3/left/seq007/segmentation"));

    let store = annotated_store();
    SampleExport::from_store(&store).write(&target).unwrap();

    let labels: serde_json::Value =
        serde_json::from_slice(&std::fs::read(target.join("labels.json")).unwrap()).unwrap();
    let texts: serde_json::Value =
        serde_json::from_slice(&std::fs::read(target.join("texts.json")).unwrap()).unwrap();
    assert_eq!(labels["0"], serde_json::json!([[10, 10], [20, 20]]));
    assert_eq!(labels["94"], serde_json::json!([null]));
    assert_eq!(texts["0"][1]["instrument_name"], "Cadiere Forceps");
}
