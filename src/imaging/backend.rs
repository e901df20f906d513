//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the batch driver
//! needs from a codec: identify (header decode) and crop (decode, extract,
//! encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::{CropParams, CropRect, Resolution};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Crop {rect} does not fit a {}x{} image", dimensions.width, dimensions.height)]
    DegenerateCrop {
        rect: CropRect,
        dimensions: Dimensions,
    },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub dimensions: Dimensions,
    /// `None` when the file carries no usable density metadata.
    pub resolution: Option<Resolution>,
}

/// Reject rectangles that are empty or reach outside the image.
pub fn check_crop(rect: CropRect, dimensions: Dimensions) -> Result<(), BackendError> {
    if rect.fits_within(dimensions) {
        Ok(())
    } else {
        Err(BackendError::DegenerateCrop { rect, dimensions })
    }
}

/// Trait for image codec backends.
pub trait ImageBackend {
    /// Read dimensions and resolution without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Decode the source, extract `params.rect` and encode it to `params.output`.
    fn crop(&self, params: &CropParams) -> Result<(), BackendError>;
}
