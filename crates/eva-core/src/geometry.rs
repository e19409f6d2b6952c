//! Pixel-space geometry for point annotations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EvaError, Result};

/// Reference screen the legacy log format was recorded on.
const LEGACY_SCREEN_WIDTH: f64 = 1707.0;
const LEGACY_SCREEN_HEIGHT: f64 = 1067.0;

/// A point in original-frame pixel space.
///
/// Serialized as a two-element array `[x, y]`. Older logs stored fractional
/// coordinates; those are floored on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move by `step` pixels in `direction`, staying inside `size`.
    pub fn nudged(self, direction: Direction, step: i32, size: FrameSize) -> Self {
        let (dx, dy) = direction.offset();
        let moved = Self::new(
            self.x.saturating_add(dx.saturating_mul(step)),
            self.y.saturating_add(dy.saturating_mul(step)),
        );
        size.clamp(moved)
    }

    /// Original-frame pixel for display coordinates recorded at `scale`.
    /// Division happens before flooring so fractional input is not lost.
    pub fn from_display(x: f64, y: f64, scale: f64) -> Self {
        Self::new((x / scale).floor() as i32, (y / scale).floor() as i32)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x.floor() as i32, y.floor() as i32)
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of the original video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp a point to `[0, width-1] x [0, height-1]`.
    pub fn clamp(self, point: Point) -> Point {
        let max_x = (self.width.saturating_sub(1)).min(i32::MAX as u32) as i32;
        let max_y = (self.height.saturating_sub(1)).min(i32::MAX as u32) as i32;
        Point::new(point.x.clamp(0, max_x), point.y.clamp(0, max_y))
    }

    /// Check if a point lies inside the frame.
    pub fn contains(self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.width
            && (point.y as u32) < self.height
    }

    /// Display scale the legacy `history` log format was recorded at.
    ///
    /// The legacy tool scaled frames to fit a 1707x1067 screen next to the
    /// context panel and stored points in display pixels. The factor is
    /// quantised through the integer display height the same way.
    pub fn legacy_display_scale(self) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let fit = (LEGACY_SCREEN_WIDTH / w / 1.5).min(LEGACY_SCREEN_HEIGHT / h) * 0.9;
        let display_height = (h * fit).floor();
        // Frames too flat to get a single display row were never shown scaled.
        if display_height <= 0.0 {
            return 1.0;
        }
        display_height / h
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Nudge direction for fine point adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// Unit pixel offset, with y growing downwards.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = EvaError;

    /// Numeric codes used by the keyboard bindings: 0 left, 1 up, 2 right, 3 down.
    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Left),
            1 => Ok(Self::Up),
            2 => Ok(Self::Right),
            3 => Ok(Self::Down),
            other => Err(EvaError::InvalidParameter(format!(
                "unknown direction code {other}"
            ))),
        }
    }
}
