//! Image trimming in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` + density headers |
//! | **Plan** | [`plan_crop`] (pure geometry) |
//! | **Crop → same format** | `crop_imm` + format encoder |
//! | **Resolution** | JFIF APP0 / PNG `pHYs` via [`density`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for ratio and crop math (unit testable)
//! - **Parameters**: Data structures describing a trim request and its result
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod density;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
pub use calculations::{
    RequestedAspect, is_landscape, nearly_equal, plan_crop, ratio, resolve_requested_ratio,
};
pub use operations::{
    CORRECTED_FOLDER, TrimOutcome, TrimSettings, corrected_path, plan_trim, trim_image,
};
pub use params::{CropParams, CropRect, ParamError, Quality, Resolution, TrimSpec};
pub use rust_backend::{RustBackend, format_for_path};
