//! Keyframe schedule: which frames of a clip are eligible for annotation.
//!
//! A clip of `n` frames is sampled every [`KEYFRAME_INTERVAL`] frames, and the
//! final frame is always included so the end of the clip is covered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default sampling interval between keyframes.
pub const KEYFRAME_INTERVAL: usize = 30;

/// Index of the reference keyframe every other keyframe is reconciled against.
pub const REFERENCE_KEYFRAME: usize = 0;

/// Ordered set of keyframe indices, fixed when a video is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeSchedule {
    /// Sorted, deduplicated frame indices.
    frames: Vec<usize>,
}

impl KeyframeSchedule {
    /// Schedule for a clip of `frame_count` frames at the default interval.
    pub fn from_frame_count(frame_count: usize) -> Self {
        Self::with_interval(frame_count, KEYFRAME_INTERVAL)
    }

    /// Schedule for a clip of `frame_count` frames, one keyframe every
    /// `interval` frames plus the final frame. An interval of 0 is treated as 1.
    pub fn with_interval(frame_count: usize, interval: usize) -> Self {
        let interval = interval.max(1);
        let last = frame_count.checked_sub(1);
        let frames = (0..frame_count)
            .filter(|&i| i % interval == 0 || Some(i) == last)
            .collect();
        Self { frames }
    }

    /// Build a schedule from explicit indices.
    pub fn from_frames(frames: impl IntoIterator<Item = usize>) -> Self {
        let mut frames: Vec<usize> = frames.into_iter().collect();
        frames.sort_unstable();
        frames.dedup();
        Self { frames }
    }

    /// Whether `frame` is a keyframe.
    pub fn contains(&self, frame: usize) -> bool {
        self.frames.binary_search(&frame).is_ok()
    }

    /// Position of `frame` within the schedule.
    pub fn position(&self, frame: usize) -> Option<usize> {
        self.frames.binary_search(&frame).ok()
    }

    /// The keyframe immediately preceding `frame` in schedule order.
    ///
    /// `None` if `frame` is not a keyframe or is the first one.
    pub fn previous(&self, frame: usize) -> Option<usize> {
        let pos = self.position(frame)?;
        pos.checked_sub(1).map(|p| self.frames[p])
    }

    /// The keyframe immediately following `frame` in schedule order.
    pub fn next(&self, frame: usize) -> Option<usize> {
        let pos = self.position(frame)?;
        self.frames.get(pos + 1).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Last keyframe (the final frame of the clip).
    pub fn last(&self) -> Option<usize> {
        self.frames.last().copied()
    }
}

impl fmt::Display for KeyframeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyframeSchedule({} keyframes)", self.frames.len())
    }
}
