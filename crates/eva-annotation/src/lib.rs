//! EVA Annotation - Keyframe annotation model
//!
//! Implements the per-video annotation state:
//! - Paired point/prompt slots per keyframe
//! - Auto-fill from a reference keyframe
//! - Auto-fix against keyframe 0 with a record of every correction
//! - Log persistence (current and legacy layouts)
//! - Settings and per-sample export

pub mod export;
pub mod fix;
pub mod serialization;
pub mod settings;
pub mod store;

pub use export::{clip_file_name, ExportLayout, SampleExport};
pub use fix::{FixKind, FixRecord};
pub use serialization::{
    AnnotationLog, LegacyTrack, LoadedLog, LogFile, LogVersion, PointTrack, PromptTrack,
};
pub use settings::{AutoFillStrategy, Settings};
pub use store::{AnnotationStore, Slot, SlotState};
