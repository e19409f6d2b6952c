//! Per-video annotation store.
//!
//! Each keyframe owns an ordered list of [`Slot`]s. A slot pairs the point
//! annotation with the prompt annotation that describes it, so the point and
//! prompt sequences of a keyframe always have the same length.

use std::collections::BTreeMap;

use eva_core::{
    Direction, EvaError, FrameSize, KeyframeSchedule, Point, PromptAnnotation, Result,
    REFERENCE_KEYFRAME,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::serialization::{
    AnnotationLog, LegacyTrack, LoadedLog, LogVersion, PointTrack, PromptTrack,
};
use crate::settings::AutoFillStrategy;

/// One annotation position on a keyframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub point: Option<Point>,
    pub prompt: Option<PromptAnnotation>,
}

impl Slot {
    pub fn is_vacant(&self) -> bool {
        self.point.is_none()
    }
}

/// Whether a slot holds a point, as shown by the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Vacant,
    Labeled,
}

/// Annotations for every keyframe of one loaded video.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    schedule: KeyframeSchedule,
    frame_size: FrameSize,
    keyframes: BTreeMap<usize, Vec<Slot>>,
}

impl AnnotationStore {
    /// Empty store: one vacant slot per keyframe.
    pub fn new(schedule: KeyframeSchedule, frame_size: FrameSize) -> Self {
        let keyframes = schedule.iter().map(|k| (k, vec![Slot::default()])).collect();
        Self {
            schedule,
            frame_size,
            keyframes,
        }
    }

    /// Seed a store from a loaded log, rescaling legacy points by the
    /// frame size's legacy display scale.
    pub fn open(schedule: KeyframeSchedule, frame_size: FrameSize, log: LoadedLog) -> Self {
        let scale = frame_size.legacy_display_scale();
        Self::seed(schedule, frame_size, log, scale)
    }

    /// Seed a store from a loaded log with an explicit legacy scale.
    ///
    /// Missing or corrupt logs yield an empty store. The scale must be
    /// positive and finite.
    pub fn open_with_legacy_scale(
        schedule: KeyframeSchedule,
        frame_size: FrameSize,
        log: LoadedLog,
        legacy_scale: f64,
    ) -> Result<Self> {
        if !(legacy_scale.is_finite() && legacy_scale > 0.0) {
            return Err(EvaError::InvalidParameter(format!(
                "legacy scale must be positive, got {}",
                legacy_scale
            )));
        }
        Ok(Self::seed(schedule, frame_size, log, legacy_scale))
    }

    fn seed(
        schedule: KeyframeSchedule,
        frame_size: FrameSize,
        log: LoadedLog,
        legacy_scale: f64,
    ) -> Self {
        match log {
            LoadedLog::Missing => {
                debug!("No annotation log, starting empty");
                Self::new(schedule, frame_size)
            }
            LoadedLog::Corrupt { reason } => {
                warn!("Ignoring unreadable annotation log: {}", reason);
                Self::new(schedule, frame_size)
            }
            LoadedLog::Parsed { version, mut log } => {
                if version == LogVersion::Legacy {
                    if let Some(history) = log.history.take() {
                        log.tracking = Some(rescale_legacy(history, legacy_scale));
                    }
                    info!("Migrated legacy log at display scale {:.4}", legacy_scale);
                }
                Self::from_log(schedule, frame_size, log)
            }
        }
    }

    /// Build a store from parsed log tracks.
    ///
    /// Point and prompt sequences are zipped per keyframe, padding the
    /// shorter one with absent entries. Scheduled keyframes absent from the
    /// log get one vacant slot; keys outside the schedule are kept. Legacy
    /// points that were not migrated are taken at scale 1.
    pub fn from_log(schedule: KeyframeSchedule, frame_size: FrameSize, log: AnnotationLog) -> Self {
        let mut points = match (log.tracking, log.history) {
            (Some(tracking), _) => tracking,
            (None, Some(history)) => rescale_legacy(history, 1.0),
            (None, None) => PointTrack::new(),
        };
        let mut prompts = log.text.unwrap_or_default();

        let mut keys: Vec<usize> = points.keys().chain(prompts.keys()).copied().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut keyframes = BTreeMap::new();
        for key in keys {
            let point_seq = points.remove(&key).unwrap_or_default();
            let prompt_seq = prompts.remove(&key).unwrap_or_default();
            let len = point_seq.len().max(prompt_seq.len());
            let mut point_iter = point_seq.into_iter();
            let mut prompt_iter = prompt_seq.into_iter();
            let slots = (0..len)
                .map(|_| Slot {
                    point: point_iter.next().flatten(),
                    prompt: prompt_iter.next().flatten(),
                })
                .collect();
            keyframes.insert(key, slots);
        }
        for key in schedule.iter() {
            keyframes.entry(key).or_insert_with(|| vec![Slot::default()]);
        }

        Self {
            schedule,
            frame_size,
            keyframes,
        }
    }

    /// Split the store back into the two log tracks.
    pub fn to_log(&self) -> AnnotationLog {
        AnnotationLog {
            tracking: Some(self.point_track()),
            text: Some(self.prompt_track()),
            history: None,
        }
    }

    /// Point sequences of every keyframe.
    pub fn point_track(&self) -> PointTrack {
        self.keyframes
            .iter()
            .map(|(&k, slots)| (k, slots.iter().map(|s| s.point).collect()))
            .collect()
    }

    /// Prompt sequences of every keyframe.
    pub fn prompt_track(&self) -> PromptTrack {
        self.keyframes
            .iter()
            .map(|(&k, slots)| (k, slots.iter().map(|s| s.prompt.clone()).collect()))
            .collect()
    }

    // ── Editing ─────────────────────────────────────────────────

    /// Insert a vacant slot at `index`. Indices past the end append.
    pub fn insert(&mut self, keyframe: usize, index: usize) -> Result<()> {
        let slots = self.slots_mut(keyframe)?;
        let index = index.min(slots.len());
        slots.insert(index, Slot::default());
        debug!("Inserted slot {} on keyframe {}", index, keyframe);
        Ok(())
    }

    /// Append a vacant slot.
    pub fn append(&mut self, keyframe: usize) -> Result<()> {
        self.slots_mut(keyframe)?.push(Slot::default());
        debug!("Appended slot on keyframe {}", keyframe);
        Ok(())
    }

    /// Remove the slot at `index`, point and prompt together.
    pub fn delete(&mut self, keyframe: usize, index: usize) -> Result<Slot> {
        let slots = self.slots_mut(keyframe)?;
        if index >= slots.len() {
            return Err(EvaError::SlotOutOfRange {
                keyframe,
                index,
                len: slots.len(),
            });
        }
        debug!("Deleted slot {} on keyframe {}", index, keyframe);
        Ok(slots.remove(index))
    }

    /// Overwrite the point at `index`.
    pub fn set_point(&mut self, keyframe: usize, index: usize, point: Point) -> Result<()> {
        self.slot_mut(keyframe, index)?.point = Some(point);
        Ok(())
    }

    /// Overwrite the prompt at `index`, padding with vacant slots if needed.
    pub fn set_prompt(
        &mut self,
        keyframe: usize,
        index: usize,
        prompt: Option<PromptAnnotation>,
    ) -> Result<()> {
        let slots = self.slots_mut(keyframe)?;
        if index >= slots.len() {
            let len = index.checked_add(1).ok_or(EvaError::SlotOutOfRange {
                keyframe,
                index,
                len: slots.len(),
            })?;
            slots.resize_with(len, Slot::default);
        }
        slots[index].prompt = prompt;
        Ok(())
    }

    /// Replace `keyframe`'s slots with a copy of another keyframe's.
    ///
    /// Returns `false` without touching anything when `keyframe` is the
    /// reference keyframe, which has nothing to fill from.
    pub fn auto_fill(&mut self, keyframe: usize, strategy: AutoFillStrategy) -> Result<bool> {
        if keyframe == REFERENCE_KEYFRAME {
            debug!("Auto-fill on the reference keyframe ignored");
            return Ok(false);
        }
        let source = match strategy {
            AutoFillStrategy::FromFirstFrame => REFERENCE_KEYFRAME,
            AutoFillStrategy::FromPreviousFrame => self
                .schedule
                .previous(keyframe)
                .ok_or(EvaError::KeyframeNotFound(keyframe))?,
        };
        let copied = self.slots(source)?.to_vec();
        *self.slots_mut(keyframe)? = copied;
        debug!("Auto-filled keyframe {} from keyframe {}", keyframe, source);
        Ok(true)
    }

    /// Nudge the point at `index` by `step` pixels, clamped to the frame.
    /// Vacant slots are left alone.
    pub fn fix_point(
        &mut self,
        keyframe: usize,
        index: usize,
        direction: Direction,
        step: i32,
    ) -> Result<()> {
        let frame_size = self.frame_size;
        let slot = self.slot_mut(keyframe, index)?;
        if let Some(point) = slot.point {
            slot.point = Some(point.nudged(direction, step, frame_size));
        }
        Ok(())
    }

    /// Clear the point at `index`. The prompt is kept.
    pub fn cancel(&mut self, keyframe: usize, index: usize) -> Result<()> {
        self.slot_mut(keyframe, index)?.point = None;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn schedule(&self) -> &KeyframeSchedule {
        &self.schedule
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    /// Keys that hold annotations, in ascending order.
    pub fn keyframes(&self) -> impl Iterator<Item = usize> + '_ {
        self.keyframes.keys().copied()
    }

    pub fn contains_keyframe(&self, keyframe: usize) -> bool {
        self.keyframes.contains_key(&keyframe)
    }

    pub fn slots(&self, keyframe: usize) -> Result<&[Slot]> {
        self.keyframes
            .get(&keyframe)
            .map(Vec::as_slice)
            .ok_or(EvaError::KeyframeNotFound(keyframe))
    }

    pub fn slot_count(&self, keyframe: usize) -> Result<usize> {
        self.slots(keyframe).map(<[Slot]>::len)
    }

    pub fn points(&self, keyframe: usize) -> Result<Vec<Option<Point>>> {
        Ok(self.slots(keyframe)?.iter().map(|s| s.point).collect())
    }

    pub fn prompts(&self, keyframe: usize) -> Result<Vec<Option<PromptAnnotation>>> {
        Ok(self.slots(keyframe)?.iter().map(|s| s.prompt.clone()).collect())
    }

    /// Prompt at `index`, or `None` if the slot is vacant or does not exist.
    pub fn prompt(&self, keyframe: usize, index: usize) -> Option<&PromptAnnotation> {
        self.keyframes
            .get(&keyframe)?
            .get(index)?
            .prompt
            .as_ref()
    }

    /// Labeled/vacant state of each slot on `keyframe`.
    pub fn slot_states(&self, keyframe: usize) -> Result<Vec<SlotState>> {
        Ok(self
            .slots(keyframe)?
            .iter()
            .map(|s| {
                if s.is_vacant() {
                    SlotState::Vacant
                } else {
                    SlotState::Labeled
                }
            })
            .collect())
    }

    /// First keyframe, in schedule order, whose slot `index` holds a point.
    pub fn first_annotated_keyframe(&self, index: usize) -> Option<usize> {
        self.schedule.iter().find(|k| {
            self.keyframes
                .get(k)
                .and_then(|slots| slots.get(index))
                .is_some_and(|slot| slot.point.is_some())
        })
    }

    pub(crate) fn slots_mut(&mut self, keyframe: usize) -> Result<&mut Vec<Slot>> {
        self.keyframes
            .get_mut(&keyframe)
            .ok_or(EvaError::KeyframeNotFound(keyframe))
    }

    fn slot_mut(&mut self, keyframe: usize, index: usize) -> Result<&mut Slot> {
        let slots = self.slots_mut(keyframe)?;
        let len = slots.len();
        slots.get_mut(index).ok_or(EvaError::SlotOutOfRange {
            keyframe,
            index,
            len,
        })
    }
}

fn rescale_legacy(history: LegacyTrack, scale: f64) -> PointTrack {
    history
        .into_iter()
        .map(|(k, seq)| {
            let points = seq
                .into_iter()
                .map(|p| p.map(|(x, y)| Point::from_display(x, y, scale)))
                .collect();
            (k, points)
        })
        .collect()
}
