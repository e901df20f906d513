//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Given pathname:
//!     photos/
//! photos/231.JPG
//!     Original: 4000x3000
//!     Trimmed:  4000x2667 at (0, 166)
//!     Output:   photos/Corrected/231.JPG
//! Image save failed:
//!     photos/broken.jpg
//!     Failed to decode photos/broken.jpg: ...
//!
//! Trimmed 1 images, 1 failed, 3 skipped
//! ```
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::process::{BatchSummary, ProcessEvent};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header echoing the path the user asked for.
pub fn format_given_path(raw_path: &str) -> Vec<String> {
    vec!["Given pathname:".to_string(), format!("{}{}", indent(1), raw_path)]
}

pub fn print_given_path(raw_path: &str) {
    for line in format_given_path(raw_path) {
        println!("{}", line);
    }
}

/// Shown on stderr when the path's folder does not exist.
pub fn format_invalid_path(raw_path: &str) -> Vec<String> {
    vec!["Invalid pathname:".to_string(), format!("{}{}", indent(1), raw_path)]
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ImageTrimmed(outcome) => vec![
            outcome.source.display().to_string(),
            format!(
                "{}Original: {}x{}",
                indent(1),
                outcome.original.width,
                outcome.original.height
            ),
            format!("{}Trimmed:  {}", indent(1), outcome.rect),
            format!("{}Output:   {}", indent(1), outcome.output.display()),
        ],
        ProcessEvent::ImageFailed { source, error } => vec![
            "Image save failed:".to_string(),
            format!("{}{}", indent(1), source.display()),
            format!("{}{}", indent(1), error),
        ],
        ProcessEvent::WalkFailed(error) => vec![format!("Walk error: {}", error)],
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

/// Final one-line tally.
pub fn format_summary(summary: &BatchSummary) -> String {
    format!(
        "Trimmed {} images, {} failed, {} skipped",
        summary.processed, summary.failed, summary.skipped
    )
}

pub fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", format_summary(summary));
}
