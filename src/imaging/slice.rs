//! Cut a sheet into uniformly sized shots.
//!
//! [`slice_image`] walks the grid in row-major order. For every cell it
//! fills an opaque black canvas, draws the centered fit-crop of the cell
//! onto it, encodes the canvas, and reports progress. Canvas size is fixed
//! for the whole task, so every shot of one sheet has identical dimensions.
//!
//! ## Failure policy
//!
//! - Decoding the source ([`slice_bytes`]) or acquiring the canvas fails the
//!   whole call, before any shot is produced.
//! - A cell that fails to encode is skipped: no shot, a `warn!` log, and
//!   slicing moves on. Progress is still reported for it.

use super::backend::{ImagingError, PngShotEncoder, ShotEncoder};
use super::calculations::SliceGeometry;
use super::params::{AspectRatio, GridSpec, ShotNaming};
use super::raster::RasterImage;
use crate::naming::shot_filename;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

/// One exported shot.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceResult {
    /// 0-based row-major grid index.
    pub index: usize,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Output filename (`Shot001_...png`).
    pub name: String,
}

impl SliceResult {
    /// 1-based shot number used in filenames.
    pub fn shot_number(&self) -> usize {
        self.index + 1
    }
}

const OPAQUE_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Decode `bytes` and slice the result as PNG shots.
///
/// A decode failure is fatal: nothing is sliced and no progress is reported.
pub fn slice_bytes(
    bytes: &[u8],
    grid: GridSpec,
    ratio: AspectRatio,
    naming: &ShotNaming,
    on_progress: impl FnMut(f64),
) -> Result<Vec<SliceResult>, ImagingError> {
    let image = RasterImage::decode(bytes)?;
    slice_image(&image, grid, ratio, naming, &PngShotEncoder, on_progress)
}

/// Slice a decoded image into `grid.cell_count()` shots (fewer if some
/// cells fail to encode).
///
/// `on_progress` receives `(index + 1) / cells × 100` once per cell, in
/// order, ending at exactly 100.
pub fn slice_image(
    image: &RasterImage,
    grid: GridSpec,
    ratio: AspectRatio,
    naming: &ShotNaming,
    encoder: &impl ShotEncoder,
    mut on_progress: impl FnMut(f64),
) -> Result<Vec<SliceResult>, ImagingError> {
    let geometry = SliceGeometry::plan(image.dimensions(), grid, ratio);
    let (canvas_w, canvas_h) = (geometry.canvas_width, geometry.canvas_height);
    if canvas_w == 0 || canvas_h == 0 {
        return Err(ImagingError::Surface {
            width: canvas_w,
            height: canvas_h,
        });
    }
    debug!(
        %grid,
        %ratio,
        cell_width = geometry.cell_width,
        cell_height = geometry.cell_height,
        canvas_w,
        canvas_h,
        "slicing"
    );

    let total = grid.cell_count();
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, OPAQUE_BLACK);
    let mut results = Vec::with_capacity(total);

    for (index, row, col) in geometry.cells() {
        render_cell(image, &geometry, row, col, &mut canvas);

        match encoder.encode(index, &canvas) {
            Ok(data) => results.push(SliceResult {
                index,
                data,
                width: canvas_w,
                height: canvas_h,
                name: shot_filename(index + 1, naming),
            }),
            Err(e) => warn!(index, error = %e, "dropping shot"),
        }

        on_progress(if index + 1 == total {
            100.0
        } else {
            (index + 1) as f64 / total as f64 * 100.0
        });
    }

    Ok(results)
}

/// Draw cell (`row`, `col`)'s crop onto `canvas`, scaled to the canvas size.
fn render_cell(
    image: &RasterImage,
    geometry: &SliceGeometry,
    row: u32,
    col: u32,
    canvas: &mut RgbaImage,
) {
    for pixel in canvas.pixels_mut() {
        *pixel = OPAQUE_BLACK;
    }

    let (x, y, w, h) = geometry.crop_rect(row, col).to_pixels(image.dimensions());
    let region = imageops::crop_imm(image.as_rgba(), x, y, w, h).to_image();

    if region.dimensions() == canvas.dimensions() {
        imageops::overlay(canvas, &region, 0, 0);
    } else {
        let scaled = imageops::resize(&region, canvas.width(), canvas.height(), FilterType::Triangle);
        imageops::overlay(canvas, &scaled, 0, 0);
    }
}
