//! High-level trim operations.
//!
//! These functions combine calculations with backend execution. They take the
//! user's [`TrimSpec`], compute the crop for one image, decide where the
//! result goes, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
use super::calculations::plan_crop;
use super::params::{CropParams, CropRect, Quality, Resolution, TrimSpec};
use super::rust_backend::format_for_path;
use std::path::{Path, PathBuf};

/// Name of the sub-folder that receives trimmed images.
///
/// Also reserved: traversal never descends into a folder with this name.
pub const CORRECTED_FOLDER: &str = "Corrected";

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Encoder settings that apply to every image in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrimSettings {
    pub quality: Quality,
    /// Stamped on outputs whose source carries no resolution.
    pub fallback_resolution: Option<Resolution>,
}

/// Where the trimmed copy of `source` is written:
/// `<source folder>/Corrected/<file name>`.
///
/// Returns `None` for paths without a file name (e.g. `..`).
pub fn corrected_path(source: &Path) -> Option<PathBuf> {
    let file_name = source.file_name()?;
    let folder = source.parent().unwrap_or(Path::new(""));
    Some(folder.join(CORRECTED_FOLDER).join(file_name))
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original: Dimensions,
    pub rect: CropRect,
}

/// Plan a trim without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_trim(
    source: &Path,
    info: ImageInfo,
    spec: &TrimSpec,
    settings: &TrimSettings,
) -> Result<CropParams> {
    let format = format_for_path(source).ok_or_else(|| {
        BackendError::UnsupportedFormat(
            source
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;
    let output = corrected_path(source).ok_or_else(|| BackendError::Decode {
        path: source.to_path_buf(),
        message: "path has no file name".to_string(),
    })?;

    Ok(CropParams {
        source: source.to_path_buf(),
        output,
        source_dimensions: info.dimensions,
        rect: plan_crop(info.dimensions, spec),
        format,
        resolution: info.resolution.or(settings.fallback_resolution),
        quality: settings.quality,
    })
}

/// Trim one image into its `Corrected` folder.
///
/// The folder is created on demand. The source file is never written.
pub fn trim_image(
    backend: &impl ImageBackend,
    source: &Path,
    spec: &TrimSpec,
    settings: &TrimSettings,
) -> Result<TrimOutcome> {
    let info = backend.identify(source)?;
    let params = plan_trim(source, info, spec, settings)?;
    log::debug!(
        "{}: {}x{} -> {}",
        source.display(),
        info.dimensions.width,
        info.dimensions.height,
        params.rect
    );

    if let Some(folder) = params.output.parent() {
        std::fs::create_dir_all(folder)?;
    }
    backend.crop(&params)?;

    Ok(TrimOutcome {
        source: params.source,
        output: params.output,
        original: info.dimensions,
        rect: params.rect,
    })
}
