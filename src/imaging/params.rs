//! Value types passed between the slicing stages.
//!
//! These structs describe *what* to cut, not *how*. Detection produces a
//! [`GridSpec`], the ratio resolver produces an [`AspectRatio`], and the slice
//! engine consumes both together with a [`ShotNaming`] context.
//!
//! ## Types
//!
//! - [`GridSpec`]: rows × cols partition. Components are clamped to ≥ 1 on construction.
//! - [`AspectRatio`]: target width:height. Components are clamped to ≥ 1 on construction.
//! - [`CropRect`]: a floating-point rectangle in source pixel space.
//! - [`ShotNaming`]: opaque naming context copied verbatim into output filenames.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Uniform rows × cols partition of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridSpec {
    rows: u32,
    cols: u32,
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    pub fn rows(self) -> u32 {
        self.rows
    }

    pub fn cols(self) -> u32 {
        self.cols
    }

    /// Total number of cells (`rows × cols`).
    pub fn cell_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

/// Displays as `COLSxROWS`, the order the grid reads left to right.
impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Target export ratio (`width:height`). Not required to be coprime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// The ratio as a single number (`width / height`).
    pub fn value(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new(16, 9)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid aspect ratio '{0}': expected W:H with positive integers")]
pub struct ParseRatioError(String);

impl FromStr for AspectRatio {
    type Err = ParseRatioError;

    /// Parse `"16:9"` (also accepts `"16x9"` and `"16/9"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRatioError(s.to_string());
        let (w, h) = s
            .split_once([':', 'x', '/'])
            .ok_or_else(invalid)?;
        let w: u32 = w.trim().parse().map_err(|_| invalid())?;
        let h: u32 = h.trim().parse().map_err(|_| invalid())?;
        if w == 0 || h == 0 {
            return Err(invalid());
        }
        Ok(Self::new(w, h))
    }
}

/// Axis-aligned rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Whether `self` lies inside `outer` (with a small float tolerance).
    pub fn is_within(&self, outer: &CropRect) -> bool {
        const EPS: f64 = 1e-6;
        self.x + EPS >= outer.x
            && self.y + EPS >= outer.y
            && self.x + self.width <= outer.x + outer.width + EPS
            && self.y + self.height <= outer.y + outer.height + EPS
    }

    /// Snap to whole pixels, clamped to a `bounds` (width, height) image.
    ///
    /// Returns `(x, y, width, height)`; width and height are at least 1.
    pub fn to_pixels(&self, bounds: (u32, u32)) -> (u32, u32, u32, u32) {
        let (bw, bh) = bounds;
        let x = (self.x.round().max(0.0) as u32).min(bw.saturating_sub(1));
        let y = (self.y.round().max(0.0) as u32).min(bh.saturating_sub(1));
        let w = (self.width.round() as u32).clamp(1, bw - x);
        let h = (self.height.round() as u32).clamp(1, bh - y);
        (x, y, w, h)
    }
}

/// Naming context for one task's shots.
///
/// All fields are opaque strings, passed through to filenames verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShotNaming {
    pub image_name: String,
    pub task_id: String,
    pub project_id: String,
    pub scene_id: String,
}
