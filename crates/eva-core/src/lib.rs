//! EVA Core - Foundation types for keyframe annotation
//!
//! This crate provides the fundamental types used throughout EVA:
//! - Error type and result alias
//! - Pixel-space geometry (Point, FrameSize, Direction)
//! - Keyframe schedule
//! - Prompt annotations (tissue / instrument metadata)

pub mod error;
pub mod geometry;
pub mod keyframe;
pub mod prompt;

pub use error::{EvaError, Result};
pub use geometry::{Direction, FrameSize, Point};
pub use keyframe::{KeyframeSchedule, KEYFRAME_INTERVAL, REFERENCE_KEYFRAME};
pub use prompt::{
    InstrumentName, InstrumentPrompt, Location, PromptAnnotation, StatusTag, TissuePrompt,
};
