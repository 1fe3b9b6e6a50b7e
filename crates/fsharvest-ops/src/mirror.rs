//! Mirrored output layout.
//!
//! Every root gets one directory under the output root, named by its label.
//! Below that, the directory a file came from is flattened into a single
//! component by joining its path segments with `_`, so the mirrored tree is
//! never more than two levels deep:
//!
//! ```text
//! root C = C:\     C:\b\c\y.txt  ->  <out>\C\b_c\y.txt
//! root C = C:\     C:\x.txt      ->  <out>\C\x.txt
//! ```

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use fsharvest_core::{HarvestError, Root};
use fsharvest_scan::FileSystem;

/// Separator used when flattening a relative directory path.
pub const FLATTEN_SEPARATOR: &str = "_";

/// Maps source directories to their mirrored output directories.
#[derive(Debug, Clone)]
pub struct MirrorLayout {
    output_root: PathBuf,
    roots: Vec<Root>,
}

impl MirrorLayout {
    pub fn new(output_root: impl Into<PathBuf>, roots: &[Root]) -> Self {
        Self {
            output_root: output_root.into(),
            roots: roots.to_vec(),
        }
    }

    /// Output directory holding everything mirrored from `root`.
    pub fn label_dir(&self, root: &Root) -> PathBuf {
        self.output_root.join(root.label.as_str())
    }

    /// Create the output root and one directory per root label.
    ///
    /// Any failure here aborts the save, so it is reported as
    /// [`HarvestError::OutputDir`].
    pub fn prepare(&self, fs: &dyn FileSystem) -> Result<(), HarvestError> {
        let dirs = std::iter::once(self.output_root.clone())
            .chain(self.roots.iter().map(|root| self.label_dir(root)));

        for dir in dirs {
            fs.create_dir_all(&dir)
                .map_err(|source| HarvestError::OutputDir {
                    path: dir.clone(),
                    source,
                })?;
            debug!(dir = %dir.display(), "Output directory ready");
        }
        Ok(())
    }

    /// Mirrored directory for a file found in `dir`.
    ///
    /// The owning root is the one with the longest path that is a prefix of
    /// `dir`. Returns `None` when no root contains `dir`.
    pub fn target_dir(&self, dir: &Path) -> Option<PathBuf> {
        let (root, rest) = self
            .roots
            .iter()
            .filter_map(|root| dir.strip_prefix(&root.path).ok().map(|rest| (root, rest)))
            .max_by_key(|(root, _)| root.path.components().count())?;

        let label_dir = self.label_dir(root);
        match flatten(rest) {
            Some(flat) => Some(label_dir.join(flat)),
            None => Some(label_dir),
        }
    }
}

/// Join the normal components of a relative path with `_`.
fn flatten(relative: &Path) -> Option<String> {
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(FLATTEN_SEPARATOR))
    }
}
