//! Error types for EVA.

use thiserror::Error;

/// Main error type for EVA operations.
#[derive(Error, Debug)]
pub enum EvaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Keyframe {0} has no annotation entry")]
    KeyframeNotFound(usize),

    #[error("Slot {index} out of range for keyframe {keyframe} ({len} slots)")]
    SlotOutOfRange {
        keyframe: usize,
        index: usize,
        len: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Probe error: {0}")]
    Probe(String),
}

/// Result type alias for EVA operations.
pub type Result<T> = std::result::Result<T, EvaError>;
