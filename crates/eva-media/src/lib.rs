//! EVA Media - FFmpeg integration for video metadata
//!
//! This crate handles:
//! - The `VideoSource` abstraction the annotation engine is built on
//! - Probing video files for frame count, size and rate

pub mod probe;

pub use probe::{VideoInfo, VideoProbe, VideoSource};

/// Whether an `ffprobe` binary is reachable.
pub fn ffprobe_available() -> bool {
    let available = ffmpeg_sidecar::ffprobe::ffprobe_is_installed();
    tracing::debug!("ffprobe available: {}", available);
    available
}
