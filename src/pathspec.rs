//! Classification of the user-supplied path argument.
//!
//! The single positional path can mean three different things:
//!
//! | Argument | Meaning | Pattern |
//! |---|---|---|
//! | `photos/` or `.` | the folder and everything below it | `*.*` |
//! | `photos/*.JPG` | matching entries in the folder | `*.JPG` |
//! | `photos/231.JPG` | that one file | `231.JPG` |
//!
//! The pattern applies at every level of the walk, directories included. A
//! wildcard pattern that only fits file names (like `*.JPG`) will therefore not
//! match sub-folder names, so wildcard runs rarely go deeper than the base
//! folder.
//!
//! Names match ASCII case-insensitively.

use globset::{GlobBuilder, GlobMatcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// The name filter for one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePattern {
    /// `*.*`: every entry.
    All,
    /// A literal file name.
    Exact(String),
    /// A pattern containing `*` or `?`.
    Wildcard(String),
}

impl FilePattern {
    pub fn as_str(&self) -> &str {
        match self {
            FilePattern::All => "*.*",
            FilePattern::Exact(name) | FilePattern::Wildcard(name) => name,
        }
    }
}

/// Where to start and what names to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalPlan {
    pub base_folder: PathBuf,
    pub pattern: FilePattern,
}

impl TraversalPlan {
    fn directory(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_folder: base_folder.into(),
            pattern: FilePattern::All,
        }
    }

    pub fn uses_wildcards(&self) -> bool {
        matches!(self.pattern, FilePattern::Wildcard(_))
    }

    /// Compile the pattern into a name matcher.
    pub fn matcher(&self) -> Result<NameMatcher, globset::Error> {
        NameMatcher::new(&self.pattern)
    }
}

fn has_wildcards(name: &str) -> bool {
    name.contains(['*', '?'])
}

/// Classify `raw` purely by its text.
///
/// Everything up to and including the last separator is the base folder
/// (the current folder when there is none); the rest is the pattern.
pub fn classify(raw: &str) -> TraversalPlan {
    if raw == "." {
        return TraversalPlan::directory(".");
    }

    let split = raw
        .rfind(std::path::is_separator)
        .map(|i| i + 1)
        .unwrap_or(0);
    let (prefix, tail) = raw.split_at(split);

    let base_folder = if prefix.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(prefix)
    };

    let pattern = if tail.is_empty() {
        FilePattern::All
    } else if has_wildcards(tail) {
        FilePattern::Wildcard(tail.to_string())
    } else {
        FilePattern::Exact(tail.to_string())
    };

    TraversalPlan {
        base_folder,
        pattern,
    }
}

/// Classify `raw`, treating an existing directory as a folder walk even
/// without a trailing separator.
pub fn resolve(raw: &str) -> TraversalPlan {
    if Path::new(raw).is_dir() {
        return TraversalPlan::directory(raw);
    }
    classify(raw)
}

/// Compiled form of a [`FilePattern`].
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Any,
    Exact(String),
    Glob(GlobMatcher),
}

impl NameMatcher {
    pub fn new(pattern: &FilePattern) -> Result<Self, globset::Error> {
        Ok(match pattern {
            FilePattern::All => NameMatcher::Any,
            FilePattern::Wildcard(p) if p == "*" || p == "*.*" => NameMatcher::Any,
            FilePattern::Exact(name) => NameMatcher::Exact(name.clone()),
            FilePattern::Wildcard(p) => NameMatcher::Glob(
                GlobBuilder::new(&escape_brackets(p))
                    .case_insensitive(true)
                    .literal_separator(true)
                    .build()?
                    .compile_matcher(),
            ),
        })
    }

    pub fn is_match(&self, name: &OsStr) -> bool {
        match self {
            NameMatcher::Any => true,
            NameMatcher::Exact(expected) => name
                .to_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(expected)),
            NameMatcher::Glob(glob) => glob.is_match(Path::new(name)),
        }
    }
}

/// Only `*` and `?` are wildcards; brackets and braces are literal characters.
fn escape_brackets(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}
