//! Video probing: frame count, frame size and frame rate.

use std::path::Path;
use std::process::Command;

use eva_core::{EvaError, FrameSize, KeyframeSchedule, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The parts of a video the annotation engine needs.
pub trait VideoSource {
    /// Number of decodable frames.
    fn frame_count(&self) -> usize;
    /// Original frame dimensions.
    fn frame_size(&self) -> FrameSize;
    /// Frames per second.
    fn fps(&self) -> f64;

    /// Keyframe schedule at the given sampling interval.
    fn keyframe_schedule(&self, interval: usize) -> KeyframeSchedule {
        KeyframeSchedule::with_interval(self.frame_count(), interval)
    }
}

/// Video geometry known up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub frame_count: usize,
    pub frame_size: FrameSize,
    pub fps: f64,
}

impl VideoSource for VideoInfo {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}

/// A video file probed with `ffprobe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProbe {
    /// File path
    pub path: String,
    pub info: VideoInfo,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_read_frames: Option<String>,
}

impl VideoProbe {
    /// Probe a video file, decoding it once to count frames exactly.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(EvaError::Probe(format!("File not found: {}", path_str)));
        }

        let ffprobe = ffmpeg_sidecar::ffprobe::ffprobe_path();
        debug!("Probing {} with {}", path_str, ffprobe.display());

        let output = Command::new(&ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=width,height,r_frame_rate,nb_read_frames",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| EvaError::Probe(format!("Failed to run {}: {}", ffprobe.display(), e)))?;

        if !output.status.success() {
            return Err(EvaError::Probe(format!(
                "ffprobe failed on {}: {}",
                path_str,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let info = parse_probe_output(&output.stdout)?;
        info!(
            "Probed {}: {} frames, {}, {:.2} fps",
            path_str, info.frame_count, info.frame_size, info.fps
        );
        Ok(Self {
            path: path_str,
            info,
        })
    }
}

impl VideoSource for VideoProbe {
    fn frame_count(&self) -> usize {
        self.info.frame_count
    }

    fn frame_size(&self) -> FrameSize {
        self.info.frame_size
    }

    fn fps(&self) -> f64 {
        self.info.fps
    }
}

/// Parse the JSON `ffprobe` prints for the first video stream.
fn parse_probe_output(stdout: &[u8]) -> Result<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| EvaError::Probe(format!("Unreadable ffprobe output: {}", e)))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| EvaError::Probe("No video stream".to_string()))?;

    let (Some(width), Some(height)) = (stream.width, stream.height) else {
        return Err(EvaError::Probe("Video stream has no dimensions".to_string()));
    };
    let frame_count = stream
        .nb_read_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<usize>().ok())
        .ok_or_else(|| EvaError::Probe("Frame count unavailable".to_string()))?;
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(0.0);

    Ok(VideoInfo {
        frame_count,
        frame_size: FrameSize::new(width, height),
        fps,
    })
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((num, den)) => (num.trim().parse::<f64>().ok()?, den.trim().parse::<f64>().ok()?),
        None => (rate.trim().parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}
