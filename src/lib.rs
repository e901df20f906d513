//! # trimimage
//!
//! Batch image trimming. Point it at a folder, a wildcard pattern or a single
//! file, give it per-edge trims or an aspect ratio, and every supported image
//! gets a cropped copy in a `Corrected` folder next to it.
//!
//! ```text
//! trimimage photos/ t=20 b=20        # 20px off the top and bottom
//! trimimage "scans/*.tif" a=4:5      # centred 4:5 (or 5:4) crop
//! ```
//!
//! # Pipeline
//!
//! ```text
//! pathname ─► pathspec::resolve ─► scan::Walker ─► process ─► imaging::trim_image
//!             (folder + pattern)   (lazy, skips    (filters,   (plan crop, encode
//!                                   Corrected/)     reports)    into Corrected/)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pathspec`] | Classifies the path argument into a base folder and a name pattern |
//! | [`scan`] | Depth-first traversal that never enters an output folder |
//! | [`process`] | Batch driver: extension filter, per-file trim, failure isolation |
//! | [`imaging`] | Crop geometry, resolution metadata, and the `image`-crate backend |
//! | [`config`] | Optional `trimimage.toml` with encoder settings |
//! | [`output`] | CLI output formatting for progress and the final summary |
//!
//! # Design Decisions
//!
//! ## Sources Are Never Written
//!
//! Every output goes to `<folder>/Corrected/<name>`, and traversal skips any
//! folder whose name ends in `Corrected`. Re-running the tool on the same tree
//! overwrites the previous outputs instead of trimming them again.
//!
//! ## Orientation-Aware Aspect Ratios
//!
//! `a=3:2` means "long side to short side is 3 to 2", not "width to height".
//! A mixed batch of landscape and portrait scans gets the same framing on
//! each, without running the tool twice.
//!
//! ## Per-File Failure Isolation
//!
//! A corrupt file, or a trim that leaves nothing to keep, is reported and
//! skipped. Only a bad command line, a missing folder or an invalid config
//! stops the run.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pathspec;
pub mod process;
pub mod scan;
