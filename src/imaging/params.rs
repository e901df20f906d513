//! Parameter types for trim operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what each output should look like) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`TrimSpec`]: The user's request: per-edge trims plus an optional `W:H` aspect.
//! - [`CropRect`]: A resolved rectangle. Signed, so impossible requests stay visible.
//! - [`Resolution`]: Horizontal/vertical DPI copied from source to output.
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropParams`]: Everything the backend needs to produce one output file.

use super::backend::Dimensions;
use image::ImageFormat;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Unrecognized parameter: {0}")]
    UnknownKey(String),
    #[error("Invalid value for '{key}': '{value}' (expected a whole number of pixels)")]
    InvalidValue { key: String, value: String },
}

/// Trim request parsed from `key=value` command-line parameters.
///
/// Edges are pixel counts removed from each side. When `aspect` is set, it
/// recomputes the top/bottom or left/right pair for each image; the `TrimSpec`
/// itself is never modified, so every image starts from the same values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimSpec {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    /// Requested ratio in `width:height` form, e.g. `"3:2"`.
    pub aspect: Option<String>,
}

impl TrimSpec {
    /// Parse `t=`, `b=`, `l=`, `r=` and `a=` parameters.
    ///
    /// Keys are case-insensitive. Leading `=` signs are skipped, so `=5` reads
    /// as the unknown key `5`.
    pub fn from_params<S: AsRef<str>>(params: &[S]) -> Result<Self, ParamError> {
        let mut spec = Self::default();

        for raw in params {
            let raw = raw.as_ref();
            let arg = raw.to_lowercase();
            let arg = arg.trim_start_matches('=');
            let (key, value) = arg.split_once('=').unwrap_or((arg, ""));
            let (key, value) = (key.trim(), value.trim());

            match key {
                "t" => spec.top = parse_edge(key, value)?,
                "b" => spec.bottom = parse_edge(key, value)?,
                "l" => spec.left = parse_edge(key, value)?,
                "r" => spec.right = parse_edge(key, value)?,
                "a" => spec.aspect = (!value.is_empty()).then(|| value.to_string()),
                _ => return Err(ParamError::UnknownKey(raw.to_string())),
            }
        }

        Ok(spec)
    }

    /// The requested aspect ratio, if any. An empty string counts as none.
    pub fn requested_aspect(&self) -> Option<&str> {
        self.aspect.as_deref().filter(|a| !a.is_empty())
    }
}

fn parse_edge(key: &str, value: &str) -> Result<u32, ParamError> {
    value.parse().map_err(|_| ParamError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Rectangle to extract from the source image, in source pixels.
///
/// Signed so that over-trimming produces a visibly negative size instead of
/// wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub top: i64,
    pub left: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRect {
    /// `true` if the rectangle is non-empty and lies inside `dims`.
    pub fn fits_within(&self, dims: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.top >= 0
            && self.left >= 0
            && self.left + self.width <= dims.width as i64
            && self.top + self.height <= dims.height as i64
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Image resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Resolution {
    pub fn uniform(dpi: f32) -> Self {
        Self {
            horizontal: dpi,
            vertical: dpi,
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a single crop-and-encode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Dimensions reported by `identify`, used to validate `rect`.
    pub source_dimensions: Dimensions,
    pub rect: CropRect,
    /// Output format; always the source's own format.
    pub format: ImageFormat,
    /// Resolution to stamp on the output, when the format can carry it.
    pub resolution: Option<Resolution>,
    pub quality: Quality,
}
