//! Batch trimming.
//!
//! Resolves the user's path into a traversal plan, walks it, and trims every
//! supported image it finds into the `Corrected` folder beside it.
//!
//! ## Failure Model
//!
//! | Condition | Effect |
//! |---|---|
//! | Empty path, missing base folder or unusable pattern | [`ProcessError::InvalidPath`] from [`check_root`], nothing processed |
//! | Unsupported extension | counted as skipped, debug log only |
//! | Decode / crop / encode failure | [`ProcessEvent::ImageFailed`], batch continues |
//! | Folder cannot be listed | [`ProcessEvent::WalkFailed`], batch continues |
//!
//! Progress is reported through a callback on the calling thread so the
//! caller decides how to present it (see [`crate::output`]).

use crate::config::TrimConfig;
use crate::imaging::{
    BackendError, ImageBackend, RustBackend, TrimOutcome, TrimSpec, format_for_path, trim_image,
};
use crate::pathspec::{self, TraversalPlan};
use crate::scan::{ScanError, Walker};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid pathname: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Progress notification for a single walked entry.
#[derive(Debug)]
pub enum ProcessEvent {
    ImageTrimmed(TrimOutcome),
    ImageFailed { source: PathBuf, error: BackendError },
    WalkFailed(ScanError),
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed + self.failed + self.skipped
    }
}

/// Resolve `raw_path` into a plan whose base folder exists and whose
/// pattern compiles.
///
/// `.` is always accepted. An empty or blank path never is.
pub fn check_root(raw_path: &str) -> Result<TraversalPlan, ProcessError> {
    let invalid = || ProcessError::InvalidPath(raw_path.to_string());
    if raw_path.trim().is_empty() {
        return Err(invalid());
    }

    let plan = pathspec::resolve(raw_path);
    if raw_path != "." && !plan.base_folder.is_dir() {
        return Err(invalid());
    }
    if let Err(e) = plan.matcher() {
        log::debug!("Pattern {} does not compile: {e}", plan.pattern.as_str());
        return Err(invalid());
    }
    Ok(plan)
}

/// Trim everything `plan` selects using the `image`-crate backend.
pub fn process(
    plan: &TraversalPlan,
    spec: &TrimSpec,
    config: &TrimConfig,
    report: impl FnMut(ProcessEvent),
) -> Result<BatchSummary, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, plan, spec, config, report)
}

/// Process images using a specific backend (allows testing with mock).
///
/// `plan` is expected to come from [`check_root`].
pub fn process_with_backend(
    backend: &impl ImageBackend,
    plan: &TraversalPlan,
    spec: &TrimSpec,
    config: &TrimConfig,
    mut report: impl FnMut(ProcessEvent),
) -> Result<BatchSummary, ProcessError> {
    log::info!(
        "Walking {} for {}",
        plan.base_folder.display(),
        plan.pattern.as_str()
    );

    let settings = config.settings();
    let mut summary = BatchSummary::default();

    for item in Walker::new(plan)? {
        let source = match item {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{e}");
                report(ProcessEvent::WalkFailed(e));
                continue;
            }
        };

        if format_for_path(&source).is_none() {
            log::debug!("Skipping {}: unsupported extension", source.display());
            summary.skipped += 1;
            continue;
        }

        match trim_image(backend, &source, spec, &settings) {
            Ok(outcome) => {
                summary.processed += 1;
                report(ProcessEvent::ImageTrimmed(outcome));
            }
            Err(error) => {
                summary.failed += 1;
                report(ProcessEvent::ImageFailed { source, error });
            }
        }
    }

    if summary.total() == 0 {
        log::warn!(
            "Nothing matched {} in {}",
            plan.pattern.as_str(),
            plan.base_folder.display()
        );
    }
    Ok(summary)
}
