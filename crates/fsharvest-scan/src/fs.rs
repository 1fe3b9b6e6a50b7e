//! Filesystem access capability.

use std::fs;
use std::io;
use std::path::Path;

use tracing::trace;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Anything that is neither visited nor descended into.
    Other,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Dir)
    }

    /// Whether this is a `.` or `..` pseudo-entry.
    pub fn is_pseudo(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// The filesystem operations the traversal and save pipeline rely on.
pub trait FileSystem: Send + Sync {
    /// List the immediate children of `dir`.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `data` to it.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create `path` and any missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
///
/// Symlinks to files are reported as files; symlinks to directories are
/// not followed, which keeps traversal free of cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    trace!(dir = %dir.display(), %err, "unreadable entry");
                    continue;
                }
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    trace!(dir = %dir.display(), name = ?raw, "skipping non UTF-8 name");
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    trace!(path = %entry.path().display(), %err, "no file type");
                    continue;
                }
            };

            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => EntryKind::File,
                    _ => EntryKind::Other,
                }
            } else {
                EntryKind::Other
            };

            entries.push(DirEntry { name, kind });
        }

        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}
