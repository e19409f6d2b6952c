//! Per-sample dataset export.
//!
//! Each exported sample lives under
//!
//! ```text
//! <out>/<class_index>/<direction>/seqNNN/
//!   frames/        <start>ms-<end>ms-visible.mp4
//!   segmentation/  labels.json, texts.json
//! ```
//!
//! Only the annotation files are written here; placing the clip itself in
//! `frames/` is left to the caller.

use std::path::{Path, PathBuf};

use eva_core::{EvaError, Result};
use serde::Serialize;
use tracing::info;

use crate::serialization::{PointTrack, PromptTrack};
use crate::store::AnnotationStore;

pub const LABELS_FILE: &str = "labels.json";
pub const TEXTS_FILE: &str = "texts.json";

/// Location of one sample inside an export tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    pub class_index: usize,
    pub direction: String,
    pub seq_index: usize,
}

impl ExportLayout {
    pub fn new(class_index: usize, direction: impl Into<String>, seq_index: usize) -> Self {
        Self {
            class_index,
            direction: direction.into(),
            seq_index,
        }
    }

    pub fn sequence_dir(&self, out: &Path) -> PathBuf {
        out.join(self.class_index.to_string())
            .join(&self.direction)
            .join(format!("seq{:03}", self.seq_index))
    }

    pub fn frames_dir(&self, out: &Path) -> PathBuf {
        self.sequence_dir(out).join("frames")
    }

    pub fn segmentation_dir(&self, out: &Path) -> PathBuf {
        self.sequence_dir(out).join("segmentation")
    }
}

/// File name of an exported clip spanning the whole video.
///
/// The duration is measured against the whole-number frame rate, so a
/// 29.97 fps clip is timed at 29 fps.
pub fn clip_file_name(frame_count: usize, fps: f64) -> Result<String> {
    let whole_fps = fps.trunc();
    if !(whole_fps.is_finite() && whole_fps >= 1.0) {
        return Err(EvaError::InvalidParameter(format!(
            "frame rate must be at least 1 fps, got {}",
            fps
        )));
    }
    let duration_ms = (frame_count as f64 * 1000.0 / whole_fps) as u64;
    Ok(format!("{:08}ms-{:08}ms-visible.mp4", 0, duration_ms))
}

/// Final point and prompt tracks of one sample.
#[derive(Debug, Clone)]
pub struct SampleExport {
    pub labels: PointTrack,
    pub texts: PromptTrack,
}

impl SampleExport {
    pub fn from_store(store: &AnnotationStore) -> Self {
        Self {
            labels: store.point_track(),
            texts: store.prompt_track(),
        }
    }

    /// Write `labels.json` and `texts.json` into `dir`, creating it.
    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_json(&dir.join(LABELS_FILE), &self.labels)?;
        write_json(&dir.join(TEXTS_FILE), &self.texts)?;
        info!(
            "Exported {} keyframes to {}",
            self.labels.len(),
            dir.display()
        );
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec(value).map_err(|e| {
        EvaError::Serialization(format!("Failed to serialize {}: {}", path.display(), e))
    })?;
    std::fs::write(path, data)?;
    Ok(())
}
