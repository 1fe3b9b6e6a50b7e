//! File record and extension key types.

use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Extension key used for files without a `.` in their name.
pub const UNDEFINED_EXTENSION: &str = "undefined";

/// Case-folded file extension, including the leading dot.
///
/// Keys are always stored lower-cased, so `.PDF` and `.pdf` hash and compare
/// equal without a custom hasher.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionKey(CompactString);

impl ExtensionKey {
    /// Derive the key from a file name: everything from the last `.` on,
    /// or [`UNDEFINED_EXTENSION`] when there is no dot.
    pub fn of_name(name: &str) -> Self {
        match name.rfind('.') {
            Some(pos) => Self(CompactString::new(name[pos..].to_lowercase())),
            None => Self::undefined(),
        }
    }

    /// Normalize a user-supplied format such as `pdf` or `.PDF`.
    ///
    /// A missing leading dot is added. Returns `None` for blank input.
    pub fn parse_format(format: &str) -> Option<Self> {
        let trimmed = format.trim();
        if trimmed.is_empty() || trimmed == "." {
            return None;
        }
        let lowered = trimmed.to_lowercase();
        if lowered.starts_with('.') {
            Some(Self(lowered.into()))
        } else {
            Some(Self(compact_str::format_compact!(".{lowered}")))
        }
    }

    /// The sentinel key for extensionless files.
    pub fn undefined() -> Self {
        Self(CompactString::new(UNDEFINED_EXTENSION))
    }

    /// Whether this is the extensionless sentinel.
    pub fn is_undefined(&self) -> bool {
        self.0 == UNDEFINED_EXTENSION
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered file: base name plus containing directory.
///
/// Ordering is by name first, then by directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    /// Base name including extension.
    pub name: CompactString,
    /// Containing directory.
    pub path: PathBuf,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Full path to the file.
    pub fn full_path(&self) -> PathBuf {
        self.path.join(self.name.as_str())
    }

    /// Containing directory.
    pub fn dir(&self) -> &Path {
        &self.path
    }

    /// Case-folded extension key of this file.
    pub fn extension(&self) -> ExtensionKey {
        ExtensionKey::of_name(&self.name)
    }
}

/// A matched file together with its bytes, staged for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub record: FileRecord,
    pub data: Vec<u8>,
}

impl FileContent {
    pub fn new(record: FileRecord, data: Vec<u8>) -> Self {
        Self { record, data }
    }

    /// Size of the buffered content in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
