//! Filesystem roots.

use std::fmt;
use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A top-level entry point for traversal, such as a drive or mount.
///
/// The label names the per-root directory in the mirrored output tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root {
    pub label: CompactString,
    pub path: PathBuf,
}

impl Root {
    pub fn new(label: impl Into<CompactString>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    /// Parse a `LABEL=PATH` specification.
    ///
    /// A bare path is accepted too; its last component becomes the label.
    /// Labels name a single output directory, so separators and `.`/`..`
    /// are rejected.
    pub fn parse(spec: &str) -> Option<Self> {
        if let Some((label, path)) = spec.split_once('=') {
            let label = label.trim();
            if !is_valid_label(label) || path.is_empty() {
                return None;
            }
            return Some(Self::new(label, path));
        }

        let path = PathBuf::from(spec);
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())?;
        Some(Self::new(label, path))
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label != "." && label != ".." && !label.contains(['/', '\\'])
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.path.display())
    }
}
