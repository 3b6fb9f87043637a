//! Shared test utilities for the gridcut test suite.
//!
//! Builds synthetic contact sheets in memory so detection and slicing tests
//! never depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let sheet = raster(grid_sheet(900, 900, 3, 3));
//! assert_eq!(detect_grid(&sheet), GridSpec::new(3, 3));
//! ```

use crate::imaging::RasterImage;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::path::Path;

/// Colour of the plain gutters between cells.
pub const GUTTER: [u8; 3] = [40, 40, 40];

// =========================================================================
// Image builders
// =========================================================================

/// Uniformly coloured opaque image.
pub fn flat_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// A `rows × cols` sheet: textured cells separated by flat gutters.
pub fn grid_sheet(width: u32, height: u32, rows: u32, cols: u32) -> RgbaImage {
    let row_seams: Vec<f64> = (1..rows).map(|i| i as f64 / rows as f64).collect();
    let col_seams: Vec<f64> = (1..cols).map(|i| i as f64 / cols as f64).collect();
    seamed_sheet(width, height, &row_seams, &col_seams)
}

/// Textured image with flat gutters at the given fractional positions.
///
/// Cell texture is red stripes along x and green stripes along y, so every
/// horizontal and vertical line through a cell carries edge energy. Stripe
/// period and gutter width scale with the image so they survive the
/// detector's downsampling.
pub fn seamed_sheet(width: u32, height: u32, row_seams: &[f64], col_seams: &[f64]) -> RgbaImage {
    let scale = (width as f64 / 300.0).max(1.0);
    let period = (6.0 * scale).round().max(2.0) as u32;
    let half_gutter = 6.0 * scale;

    let in_gutter = |pos: u32, extent: u32, seams: &[f64]| {
        seams
            .iter()
            .any(|s| (pos as f64 + 0.5 - s * extent as f64).abs() <= half_gutter)
    };

    RgbaImage::from_fn(width, height, |x, y| {
        if in_gutter(x, width, col_seams) || in_gutter(y, height, row_seams) {
            return Rgba([GUTTER[0], GUTTER[1], GUTTER[2], 255]);
        }
        let r = if (x / (period / 2)) % 2 == 0 { 30 } else { 230 };
        let g = if (y / (period / 2)) % 2 == 0 { 30 } else { 230 };
        Rgba([r, g, 128, 255])
    })
}

/// Sheet where each cell is a distinct flat colour (`cell_color(index)`).
pub fn colored_cells(width: u32, height: u32, rows: u32, cols: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let col = (x * cols / width).min(cols - 1);
        let row = (y * rows / height).min(rows - 1);
        let [r, g, b] = cell_color((row * cols + col) as usize);
        Rgba([r, g, b, 255])
    })
}

/// Colour used by [`colored_cells`] for the cell at row-major `index`.
pub fn cell_color(index: usize) -> [u8; 3] {
    let i = index as u8;
    [i.wrapping_mul(23).wrapping_add(10), 255 - i.wrapping_mul(17), i.wrapping_mul(5)]
}

pub fn raster(img: RgbaImage) -> RasterImage {
    RasterImage::from_rgba(img).unwrap()
}

// =========================================================================
// Encoding helpers
// =========================================================================

pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

/// Write `img` as a PNG file, creating parent directories.
pub fn write_png(path: &Path, img: &RgbaImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, encode_png(img)).unwrap();
}
