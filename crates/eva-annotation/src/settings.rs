//! Annotation settings, persisted as JSON.

use std::path::Path;

use eva_core::{EvaError, Result, KEYFRAME_INTERVAL};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where auto-fill copies annotations from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoFillStrategy {
    /// Copy keyframe 0.
    #[default]
    #[serde(rename = "From first frame")]
    FromFirstFrame,
    /// Copy the keyframe immediately before the target.
    #[serde(rename = "From previous frame")]
    FromPreviousFrame,
}

/// User-tunable behaviour of an annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auto_fill: AutoFillStrategy,
    /// Run auto-fix whenever a keyframe is visited.
    pub simplify_annotation: bool,
    /// Pixels moved per nudge.
    pub nudge_step: i32,
    pub keyframe_interval: usize,
    /// Overrides the computed display scale when migrating legacy logs.
    pub legacy_scale: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_fill: AutoFillStrategy::FromFirstFrame,
            simplify_annotation: false,
            nudge_step: 1,
            keyframe_interval: KEYFRAME_INTERVAL,
            legacy_scale: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)
            .map_err(|e| EvaError::Serialization(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EvaError::Serialization(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.nudge_step < 0 {
            return Err(EvaError::InvalidParameter(format!(
                "nudge_step must be non-negative, got {}",
                self.nudge_step
            )));
        }
        if self.keyframe_interval == 0 {
            return Err(EvaError::InvalidParameter(
                "keyframe_interval must be at least 1".to_string(),
            ));
        }
        if let Some(scale) = self.legacy_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(EvaError::InvalidParameter(format!(
                    "legacy_scale must be positive, got {}",
                    scale
                )));
            }
        }
        Ok(())
    }
}
