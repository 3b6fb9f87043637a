//! Grid-size detection from pixel content.
//!
//! Composite sheets are usually laid out with plain gutters (or at least
//! hard seams) between cells. Along a seam, neighbouring pixels barely
//! change; through the middle of a cell they change a lot. The detector
//! compares the two on a small scan copy of the image:
//!
//! 1. Resample to [`SCAN_WIDTH`] pixels wide.
//! 2. For a candidate count `k` on one axis, average the line energy at the
//!    `k - 1` boundaries `i/k` and at the `k` cell centers `(i + 0.5)/k`.
//! 3. Accept `k` when the boundary average is below [`SEAM_RATIO`] × the
//!    center average. `k = 3` is tried before `k = 2`; nothing passing → 1.
//! 4. No split on either axis and a near-square image → assume 3×3.
//!
//! A perfectly flat image has zero center energy; that never counts as a
//! split.

use super::params::GridSpec;
use super::raster::RasterImage;
use image::Rgba;
use tracing::debug;

/// Width of the resampled buffer used for analysis.
pub const SCAN_WIDTH: u32 = 300;

/// Boundary energy must be below this fraction of the cell-center energy.
pub const SEAM_RATIO: f64 = 0.45;

/// Split counts tried per axis, in order. First accepted wins.
const SPLIT_CANDIDATES: [u32; 2] = [3, 2];

/// Aspect range (inclusive) treated as "near square" for the 3×3 default.
const SQUARE_MIN: f64 = 0.8;
const SQUARE_MAX: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Horizontal lines; splits produce rows.
    Rows,
    /// Vertical lines; splits produce columns.
    Cols,
}

/// Infer how many rows and columns `image` is divided into.
pub fn detect_grid(image: &RasterImage) -> GridSpec {
    let scan = image.downsample(SCAN_WIDTH);
    let rows = detect_axis(&scan, Axis::Rows);
    let cols = detect_axis(&scan, Axis::Cols);

    if rows == 1 && cols == 1 {
        let aspect = image.aspect();
        if (SQUARE_MIN..=SQUARE_MAX).contains(&aspect) {
            debug!(aspect, "no seams found, near-square image: defaulting to 3x3");
            return GridSpec::new(3, 3);
        }
    }

    GridSpec::new(rows, cols)
}

fn detect_axis(scan: &RasterImage, axis: Axis) -> u32 {
    SPLIT_CANDIDATES
        .into_iter()
        .find(|&count| split_accepted(scan, axis, count))
        .unwrap_or(1)
}

/// Whether `count` equal parts along `axis` look like a deliberate grid.
fn split_accepted(scan: &RasterImage, axis: Axis, count: u32) -> bool {
    if count <= 1 {
        return true;
    }
    let k = count as f64;
    let boundary = average((1..count).map(|i| line_energy(scan, axis, i as f64 / k)));
    let interior = average((0..count).map(|i| line_energy(scan, axis, (i as f64 + 0.5) / k)));

    // Flat content: no evidence either way, so no split.
    if interior <= 0.0 {
        debug!(?axis, count, "zero interior energy, split rejected");
        return false;
    }

    let accepted = boundary < SEAM_RATIO * interior;
    debug!(?axis, count, boundary, interior, accepted, "split score");
    accepted
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Mean RGB change between neighbouring pixels along one scan line.
///
/// `position` ∈ [0, 1] selects the line; for [`Axis::Rows`] it is a
/// horizontal line at `floor(position × (height - 1))`. The sum is
/// normalised by the line length in pixels.
fn line_energy(scan: &RasterImage, axis: Axis, position: f64) -> f64 {
    let (width, height) = scan.dimensions();
    match axis {
        Axis::Rows => {
            let y = (position * (height - 1) as f64).floor() as u32;
            let total: u32 = (0..width - 1)
                .map(|x| rgb_delta(scan.pixel(x, y), scan.pixel(x + 1, y)))
                .sum();
            total as f64 / width as f64
        }
        Axis::Cols => {
            let x = (position * (width - 1) as f64).floor() as u32;
            let total: u32 = (0..height - 1)
                .map(|y| rgb_delta(scan.pixel(x, y), scan.pixel(x, y + 1)))
                .sum();
            total as f64 / height as f64
        }
    }
}

fn rgb_delta(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    a.0[..3]
        .iter()
        .zip(&b.0[..3])
        .map(|(p, q)| p.abs_diff(*q) as u32)
        .sum()
}
