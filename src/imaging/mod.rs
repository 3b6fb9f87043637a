//! Image analysis and slicing engine: pure Rust, headless.
//!
//! | Stage | Function |
//! |---|---|
//! | **Decode** | [`RasterImage::decode`] (`image` crate) |
//! | **Detect grid** | [`detect_grid`]: edge energy on a 300px scan copy |
//! | **Resolve ratio** | [`resolve_ratio`]: canonical table, then rational fallback |
//! | **Slice** | [`slice_image`]: centered fit-crop per cell → PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Value types describing grids, ratios and naming
//! - **Backend**: [`ShotEncoder`] trait + [`PngShotEncoder`], error taxonomy
//! - **Raster / detect / ratio / slice**: the engine stages above

pub mod backend;
mod calculations;
mod detect;
mod params;
mod ratio;
mod raster;
mod slice;

pub use backend::{ImagingError, PngShotEncoder, ShotEncoder};
pub use calculations::{SliceGeometry, cell_size, fit_extract_size};
pub use detect::{SCAN_WIDTH, SEAM_RATIO, detect_grid};
pub use params::{AspectRatio, CropRect, GridSpec, ParseRatioError, ShotNaming};
pub use ratio::{CANONICAL_RATIOS, CANONICAL_TOLERANCE, resolve_ratio};
pub use raster::{RasterImage, is_supported_image, supported_input_extensions};
pub use slice::{SliceResult, slice_bytes, slice_image};

/// Detected grid plus the ratio its cells snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analysis {
    pub grid: GridSpec,
    pub ratio: AspectRatio,
}

/// Detect the grid, then resolve the export ratio from the resulting cell size.
pub fn analyze(image: &RasterImage) -> Analysis {
    let grid = detect_grid(image);
    let (cell_w, cell_h) = cell_size(image.dimensions(), grid);
    Analysis {
        grid,
        ratio: resolve_ratio(cell_w, cell_h),
    }
}
