//! Pure geometry for grid slicing.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are floating-point source pixels; rounding to whole pixels
//! happens only when sizing the output canvas and when copying pixels.

use super::params::{AspectRatio, CropRect, GridSpec};

/// Size of a single cell when an image is split by `grid`.
///
/// # Examples
/// ```
/// # use gridcut::imaging::{GridSpec, cell_size};
/// assert_eq!(cell_size((900, 600), GridSpec::new(3, 3)), (300.0, 200.0));
/// ```
pub fn cell_size(image: (u32, u32), grid: GridSpec) -> (f64, f64) {
    (
        image.0 as f64 / grid.cols() as f64,
        image.1 as f64 / grid.rows() as f64,
    )
}

/// Largest `ratio`-shaped rectangle that fits inside a cell ("fit crop").
///
/// A cell wider than the target keeps its full height; otherwise it keeps
/// its full width. The result never exceeds the cell on either axis.
///
/// # Examples
/// ```
/// # use gridcut::imaging::{AspectRatio, fit_extract_size};
/// // 400x200 cell, 1:1 target → keep full height
/// assert_eq!(fit_extract_size((400.0, 200.0), AspectRatio::new(1, 1)), (200.0, 200.0));
/// ```
pub fn fit_extract_size(cell: (f64, f64), ratio: AspectRatio) -> (f64, f64) {
    let (cell_w, cell_h) = cell;
    let target = ratio.value();

    if cell_w / cell_h > target {
        // Cell is wider than the target: height matches
        ((cell_h * target).min(cell_w), cell_h)
    } else {
        // Cell is taller (or equal): width matches. `min` absorbs float error.
        (cell_w, (cell_w / target).min(cell_h))
    }
}

/// Crop plan shared by every cell of one slicing task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGeometry {
    pub grid: GridSpec,
    pub cell_width: f64,
    pub cell_height: f64,
    pub extract_width: f64,
    pub extract_height: f64,
    /// Output canvas size, identical for every cell.
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl SliceGeometry {
    /// Compute the crop plan for an image of `image` (width, height) pixels.
    pub fn plan(image: (u32, u32), grid: GridSpec, ratio: AspectRatio) -> Self {
        let (cell_width, cell_height) = cell_size(image, grid);
        let (extract_width, extract_height) = fit_extract_size((cell_width, cell_height), ratio);
        Self {
            grid,
            cell_width,
            cell_height,
            extract_width,
            extract_height,
            canvas_width: extract_width.round() as u32,
            canvas_height: extract_height.round() as u32,
        }
    }

    /// Full rectangle of cell (`row`, `col`).
    pub fn cell_rect(&self, row: u32, col: u32) -> CropRect {
        CropRect {
            x: col as f64 * self.cell_width,
            y: row as f64 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Exported sub-rectangle of cell (`row`, `col`), centered in the cell.
    pub fn crop_rect(&self, row: u32, col: u32) -> CropRect {
        let cell = self.cell_rect(row, col);
        let offset_x = (self.cell_width - self.extract_width) / 2.0;
        let offset_y = (self.cell_height - self.extract_height) / 2.0;
        CropRect {
            x: cell.x + offset_x,
            y: cell.y + offset_y,
            width: self.extract_width,
            height: self.extract_height,
        }
    }

    /// Cells in row-major order as `(index, row, col)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, u32, u32)> + use<> {
        let cols = self.grid.cols();
        (0..self.grid.rows())
            .flat_map(move |r| (0..cols).map(move |c| (r, c)))
            .enumerate()
            .map(|(i, (r, c))| (i, r, c))
    }
}
