//! Owned in-memory pixel buffers.
//!
//! Every source image is decoded once into a [`RasterImage`] (RGBA, 8 bits
//! per channel) and all analysis and slicing works on that buffer. No
//! drawing surface or platform API is involved, so the engine runs headless.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Detection scan buffer | `image::imageops::resize` with `Triangle` filter |

use super::backend::ImagingError;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

/// Bytes per pixel of every [`RasterImage`].
pub const CHANNELS: usize = 4;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [supported extensions](supported_input_extensions).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Decoded RGBA8 pixel buffer. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Decode encoded image bytes (format sniffed from content).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImagingError> {
        let img = image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
        Self::from_rgba(img.to_rgba8())
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, ImagingError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes).map_err(|e| match e {
            ImagingError::Decode(reason) => {
                ImagingError::Decode(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Wrap an existing buffer. Zero-sized buffers are rejected.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, ImagingError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImagingError::Decode(format!(
                "image has no pixels ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width() as usize * CHANNELS
    }

    /// Full-image aspect ratio (`width / height`).
    pub fn aspect(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resample to `width` pixels wide, keeping the aspect ratio.
    ///
    /// The height is `round(height / width × target)`, at least 1.
    pub fn downsample(&self, width: u32) -> RasterImage {
        let height = ((self.height() as f64 / self.width() as f64) * width as f64)
            .round()
            .max(1.0) as u32;
        let width = width.max(1);
        RasterImage {
            pixels: image::imageops::resize(&self.pixels, width, height, FilterType::Triangle),
        }
    }
}
