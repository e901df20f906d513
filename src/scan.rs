//! Directory traversal.
//!
//! Walks the base folder of a [`TraversalPlan`] depth first, yielding every
//! non-directory entry whose name matches the plan's pattern. Sub-directories
//! are entered only when their own name matches the same pattern, and output
//! folders are never entered:
//!
//! ```text
//! photos/                 # base folder, pattern *.*
//! ├── 231.JPG             # yielded
//! ├── notes.txt           # yielded (extension filtering happens later)
//! ├── day1/               # entered
//! │   └── 001.png         # yielded
//! └── Corrected/          # skipped, along with everything inside
//!     └── 231.JPG
//! ```
//!
//! The walk is lazy: nothing is listed until the iterator is polled, and a
//! folder that cannot be listed produces an `Err` item without stopping the
//! rest of the traversal.

use crate::imaging::CORRECTED_FOLDER;
use crate::pathspec::{NameMatcher, TraversalPlan};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),
}

impl From<walkdir::Error> for ScanError {
    fn from(source: walkdir::Error) -> Self {
        let path = source.path().map(Path::to_path_buf).unwrap_or_default();
        ScanError::Io { path, source }
    }
}

/// True for folders the walk must never enter.
///
/// Matches any final segment ending in `Corrected` (so `OldCorrected` too).
/// The comparison is case-sensitive.
pub fn is_output_folder(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(CORRECTED_FOLDER))
}

fn is_dots(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Lazy depth-first iterator over the files a plan selects.
pub struct Walker {
    entries: walkdir::IntoIter,
    matcher: NameMatcher,
}

impl Walker {
    pub fn new(plan: &TraversalPlan) -> Result<Self, ScanError> {
        let entries = WalkDir::new(&plan.base_folder)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(Self {
            entries,
            matcher: plan.matcher()?,
        })
    }
}

impl Iterator for Walker {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            let name = entry.file_name();
            if is_dots(name) {
                continue;
            }
            let is_dir = entry.file_type().is_dir();

            if !self.matcher.is_match(name) {
                if is_dir {
                    self.entries.skip_current_dir();
                }
                continue;
            }

            if is_dir {
                if is_output_folder(entry.path()) {
                    log::debug!("Skipping output folder {}", entry.path().display());
                    self.entries.skip_current_dir();
                }
                continue;
            }

            return Some(Ok(entry.into_path()));
        }
    }
}

/// Drive a [`Walker`] with callbacks.
///
/// Fails only if the plan's pattern does not compile; listing errors go to
/// `on_error` and the walk carries on.
pub fn walk(
    plan: &TraversalPlan,
    mut on_file: impl FnMut(PathBuf),
    mut on_error: impl FnMut(ScanError),
) -> Result<(), ScanError> {
    for item in Walker::new(plan)? {
        match item {
            Ok(path) => on_file(path),
            Err(e) => on_error(e),
        }
    }
    Ok(())
}
