//! Encoder trait and the imaging error taxonomy.
//!
//! The [`ShotEncoder`] trait is the single seam between the slice engine and
//! an output format. The production implementation is [`PngShotEncoder`]
//! (lossless PNG through the `image` crate); tests substitute encoders that
//! record calls or fail on purpose.
//!
//! ## Errors
//!
//! | Variant | Severity |
//! |---|---|
//! | [`ImagingError::Decode`] | fatal to the task, zero shots |
//! | [`ImagingError::Surface`] | fatal to the task, zero shots |
//! | [`ImagingError::Encode`] | soft: the one cell is dropped, slicing continues |
//! | [`ImagingError::Io`] | fatal (reading the source file) |

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Cannot create a {width}x{height} output surface")]
    Surface { width: u32, height: u32 },
    #[error("Failed to encode shot {index}: {reason}")]
    Encode { index: usize, reason: String },
}

/// Serializes a rendered shot canvas into output bytes.
pub trait ShotEncoder {
    /// Encode the canvas of shot `index`.
    fn encode(&self, index: usize, canvas: &RgbaImage) -> Result<Vec<u8>, ImagingError>;
}

/// Lossless PNG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngShotEncoder;

impl ShotEncoder for PngShotEncoder {
    fn encode(&self, index: usize, canvas: &RgbaImage) -> Result<Vec<u8>, ImagingError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                canvas.as_raw(),
                canvas.width(),
                canvas.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| ImagingError::Encode {
                index,
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}
