//! Property tests over random edit sequences.

use eva_annotation::{AnnotationStore, AutoFillStrategy, LoadedLog, LogFile};
use eva_core::{
    FrameSize, InstrumentName, KeyframeSchedule, Point, PromptAnnotation, StatusTag,
};
use proptest::prelude::*;

const KEYFRAMES: [usize; 3] = [0, 30, 60];

#[derive(Debug, Clone)]
enum Edit {
    Append(usize),
    Insert(usize, usize),
    Delete(usize, usize),
    SetPoint(usize, usize, Point),
    SetPrompt(usize, usize, Option<PromptAnnotation>),
    Cancel(usize, usize),
    Fill(usize, AutoFillStrategy),
}

fn keyframe() -> impl Strategy<Value = usize> {
    prop::sample::select(KEYFRAMES.to_vec())
}

fn prompt() -> impl Strategy<Value = Option<PromptAnnotation>> {
    let status = prop::sample::select(StatusTag::INSTRUMENT.to_vec());
    let name = prop::sample::select(vec![
        InstrumentName::Clip,
        InstrumentName::NeedleDiver,
        InstrumentName::Other("Suction".to_string()),
    ]);
    prop_oneof![
        Just(None),
        prop::collection::vec(prop::sample::select(StatusTag::TISSUE.to_vec()), 0..3)
            .prop_map(|tags| Some(PromptAnnotation::tissue(tags))),
        (1u32..3, 1u32..3, name, status).prop_map(|(order, point, name, status)| Some(
            PromptAnnotation::instrument(order, point, name, status)
        )),
    ]
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        keyframe().prop_map(Edit::Append),
        (keyframe(), 0usize..5).prop_map(|(k, i)| Edit::Insert(k, i)),
        (keyframe(), 0usize..5).prop_map(|(k, i)| Edit::Delete(k, i)),
        (keyframe(), 0usize..5, 0i32..320, 0i32..240)
            .prop_map(|(k, i, x, y)| Edit::SetPoint(k, i, Point::new(x, y))),
        (keyframe(), 0usize..5, prompt()).prop_map(|(k, i, p)| Edit::SetPrompt(k, i, p)),
        (keyframe(), 0usize..5).prop_map(|(k, i)| Edit::Cancel(k, i)),
        (
            keyframe(),
            prop_oneof![
                Just(AutoFillStrategy::FromFirstFrame),
                Just(AutoFillStrategy::FromPreviousFrame)
            ]
        )
            .prop_map(|(k, s)| Edit::Fill(k, s)),
    ]
}

/// Apply edits, ignoring the ones that target slots that do not exist.
fn build(edits: &[Edit]) -> AnnotationStore {
    let mut store = AnnotationStore::new(
        KeyframeSchedule::from_frame_count(61),
        FrameSize::new(320, 240),
    );
    for edit in edits {
        let _ = match edit.clone() {
            Edit::Append(k) => store.append(k),
            Edit::Insert(k, i) => store.insert(k, i),
            Edit::Delete(k, i) => store.delete(k, i).map(drop),
            Edit::SetPoint(k, i, p) => store.set_point(k, i, p),
            Edit::SetPrompt(k, i, p) => store.set_prompt(k, i, p),
            Edit::Cancel(k, i) => store.cancel(k, i),
            Edit::Fill(k, s) => store.auto_fill(k, s).map(drop),
        };
    }
    store
}

proptest! {
    #[test]
    fn point_and_prompt_tracks_stay_paired(edits in prop::collection::vec(edit(), 0..40)) {
        let store = build(&edits);
        let points = store.point_track();
        let prompts = store.prompt_track();
        prop_assert_eq!(points.len(), prompts.len());
        for (k, seq) in &points {
            prop_assert_eq!(seq.len(), prompts[k].len());
        }
    }

    #[test]
    fn auto_fix_is_idempotent(edits in prop::collection::vec(edit(), 0..40)) {
        let mut store = build(&edits);
        let reference_len = store.slot_count(0).unwrap();
        store.auto_fix_all().unwrap();
        for k in [30, 60] {
            if reference_len > 0 {
                prop_assert_eq!(store.slot_count(k).unwrap(), reference_len);
            }
            prop_assert!(store.auto_fix(k).unwrap().is_empty());
        }
    }

    #[test]
    fn log_round_trip_preserves_tracks(edits in prop::collection::vec(edit(), 0..40)) {
        let store = build(&edits);
        let bytes = LogFile::to_json(&store.to_log()).unwrap();
        let (version, log) = LogFile::from_json(&bytes).unwrap();
        let reopened = AnnotationStore::open(
            store.schedule().clone(),
            store.frame_size(),
            LoadedLog::Parsed { version, log },
        );
        prop_assert_eq!(reopened.point_track(), store.point_track());
        prop_assert_eq!(reopened.prompt_track(), store.prompt_track());
    }
}
