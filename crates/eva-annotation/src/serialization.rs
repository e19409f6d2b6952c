//! Annotation log persistence.
//!
//! The log is a JSON object with two keyed tracks:
//!
//! ```text
//! {
//!   "Tracking_Annotation": { "<keyframe>": [[x, y] | null, ...], ... },
//!   "Text_Annotation":     { "<keyframe>": [{...} | null, ...], ... }
//! }
//! ```
//!
//! The legacy format `{"history": {...}}` carries points only, recorded in
//! display pixels; [`AnnotationStore::open`](crate::AnnotationStore::open)
//! rescales them.

use std::collections::BTreeMap;
use std::path::Path;

use eva_core::{EvaError, Point, PromptAnnotation, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::AnnotationStore;

/// Point sequences keyed by keyframe.
pub type PointTrack = BTreeMap<usize, Vec<Option<Point>>>;

/// Prompt sequences keyed by keyframe.
pub type PromptTrack = BTreeMap<usize, Vec<Option<PromptAnnotation>>>;

/// Legacy point sequences in raw display coordinates.
pub type LegacyTrack = BTreeMap<usize, Vec<Option<(f64, f64)>>>;

const LEGACY_KEY: &str = "history";

/// The two tracks of a log. Either may be absent in files written by
/// older tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationLog {
    #[serde(
        rename = "Tracking_Annotation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking: Option<PointTrack>,
    #[serde(
        rename = "Text_Annotation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<PromptTrack>,
    /// Points of a legacy `history` log, not yet rescaled to frame pixels.
    #[serde(skip)]
    pub history: Option<LegacyTrack>,
}

/// Which on-disk layout a log was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogVersion {
    /// `{"history": ...}`, points in display pixels, no prompts.
    Legacy,
    /// `Tracking_Annotation` / `Text_Annotation`.
    Current,
}

/// Outcome of reading a log file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedLog {
    /// No log exists for this video yet.
    Missing,
    /// A log exists but could not be read or parsed.
    Corrupt { reason: String },
    Parsed { version: LogVersion, log: AnnotationLog },
}

impl LoadedLog {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

/// Reading and writing annotation logs.
pub struct LogFile;

impl LogFile {
    /// Parse a log from JSON bytes, detecting the legacy layout.
    pub fn from_json(data: &[u8]) -> Result<(LogVersion, AnnotationLog)> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| EvaError::Serialization(format!("Invalid JSON: {}", e)))?;

        let Some(object) = raw.as_object() else {
            return Err(EvaError::Serialization(
                "Annotation log is not a JSON object".to_string(),
            ));
        };

        if let Some(history) = object.get(LEGACY_KEY) {
            let history: LegacyTrack = serde_json::from_value(history.clone()).map_err(|e| {
                EvaError::Serialization(format!("Failed to parse legacy history: {}", e))
            })?;
            return Ok((
                LogVersion::Legacy,
                AnnotationLog {
                    history: Some(history),
                    ..AnnotationLog::default()
                },
            ));
        }

        let log = serde_json::from_value(raw)
            .map_err(|e| EvaError::Serialization(format!("Failed to parse log: {}", e)))?;
        Ok((LogVersion::Current, log))
    }

    /// Serialize a log to compact JSON bytes.
    pub fn to_json(log: &AnnotationLog) -> Result<Vec<u8>> {
        serde_json::to_vec(log)
            .map_err(|e| EvaError::Serialization(format!("Failed to serialize log: {}", e)))
    }

    /// Read the log at `path`. Never fails: unreadable files are reported as
    /// [`LoadedLog::Corrupt`].
    pub fn load(path: &Path) -> LoadedLog {
        if !path.exists() {
            return LoadedLog::Missing;
        }
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                return LoadedLog::Corrupt {
                    reason: format!("{}: {}", path.display(), e),
                }
            }
        };
        match Self::from_json(&data) {
            Ok((version, log)) => {
                info!("Loaded {:?} annotation log {}", version, path.display());
                LoadedLog::Parsed { version, log }
            }
            Err(e) => LoadedLog::Corrupt {
                reason: format!("{}: {}", path.display(), e),
            },
        }
    }

    /// Write the store to `path` in the current layout, creating parent
    /// directories.
    pub fn save(path: &Path, store: &AnnotationStore) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = Self::to_json(&store.to_log())?;
        std::fs::write(path, data)?;
        info!("Saved annotation log {}", path.display());
        Ok(())
    }
}
