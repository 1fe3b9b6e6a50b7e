//! Slot-bounded recursive directory traversal.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use fsharvest_core::{Depth, HarvestError, Root};

use crate::fs::{EntryKind, FileSystem};
use crate::pool::{TaskScope, WorkerPool};

/// Per-file callback invoked during traversal.
///
/// Visitors are called concurrently from several worker threads.
pub trait Visitor: Sync {
    /// Called once for each file, with its containing directory and name.
    fn visit(&self, dir: &Path, name: &str);
}

impl<F> Visitor for F
where
    F: Fn(&Path, &str) + Sync,
{
    fn visit(&self, dir: &Path, name: &str) {
        self(dir, name)
    }
}

/// Aggregate counters for one traversal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories successfully listed (roots included).
    pub dirs_listed: u64,
    /// Directories that could not be listed and were skipped.
    pub dirs_skipped: u64,
    /// Files handed to the visitor.
    pub files_visited: u64,
    /// Subdirectories walked inline because no slot was free.
    pub inline_descents: u64,
    /// Subdirectories walked on a separate task.
    pub spawned_descents: u64,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct WalkCounters {
    dirs_listed: AtomicU64,
    dirs_skipped: AtomicU64,
    files_visited: AtomicU64,
    inline_descents: AtomicU64,
    spawned_descents: AtomicU64,
}

impl WalkCounters {
    fn snapshot(&self, elapsed: Duration) -> WalkStats {
        WalkStats {
            dirs_listed: self.dirs_listed.load(Ordering::Relaxed),
            dirs_skipped: self.dirs_skipped.load(Ordering::Relaxed),
            files_visited: self.files_visited.load(Ordering::Relaxed),
            inline_descents: self.inline_descents.load(Ordering::Relaxed),
            spawned_descents: self.spawned_descents.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Walks directory trees on a [`WorkerPool`].
///
/// Each root is walked on its own task. Subdirectories are walked on a new
/// task when a slot is free and inline on the current thread otherwise, so
/// a walking task never blocks waiting for a slot while holding one.
pub struct Traverser<'a> {
    pool: &'a WorkerPool,
    fs: &'a dyn FileSystem,
}

impl<'a> Traverser<'a> {
    pub fn new(pool: &'a WorkerPool, fs: &'a dyn FileSystem) -> Self {
        Self { pool, fs }
    }

    /// Walk a single directory tree.
    pub fn walk<V: Visitor>(
        &self,
        root: &Path,
        depth: Depth,
        visitor: &V,
    ) -> Result<WalkStats, HarvestError> {
        self.walk_paths(std::iter::once(root.to_path_buf()), depth, visitor)
    }

    /// Walk every root concurrently, all sharing the same pool.
    pub fn walk_roots<V: Visitor>(
        &self,
        roots: &[Root],
        depth: Depth,
        visitor: &V,
    ) -> Result<WalkStats, HarvestError> {
        let stats = self.walk_paths(roots.iter().map(|r| r.path.clone()), depth, visitor)?;
        info!(
            roots = roots.len(),
            files = stats.files_visited,
            dirs = stats.dirs_listed,
            skipped = stats.dirs_skipped,
            inline = stats.inline_descents,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Traversal finished"
        );
        Ok(stats)
    }

    fn walk_paths<V: Visitor>(
        &self,
        roots: impl IntoIterator<Item = PathBuf>,
        depth: Depth,
        visitor: &V,
    ) -> Result<WalkStats, HarvestError> {
        let start = Instant::now();
        let counters = WalkCounters::default();
        let walk = Walk {
            fs: self.fs,
            visitor,
            depth,
            counters: &counters,
        };

        self.pool.scope(|tasks| {
            for root in roots {
                // The launching thread holds no slot, so blocking here is safe.
                let slot = tasks.acquire();
                tasks.spawn(slot, move |tasks| walk.list_dir(tasks, &root, 0));
            }
        })?;

        Ok(counters.snapshot(start.elapsed()))
    }
}

/// Shared, copyable state of one traversal pass.
struct Walk<'s> {
    fs: &'s dyn FileSystem,
    visitor: &'s dyn Visitor,
    depth: Depth,
    counters: &'s WalkCounters,
}

impl Clone for Walk<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for Walk<'_> {}

impl<'s> Walk<'s> {
    fn list_dir(self, tasks: &TaskScope<'_, 's>, dir: &Path, level: u32) {
        let entries = match self.fs.list_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.counters.dirs_skipped.fetch_add(1, Ordering::Relaxed);
                debug!(dir = %dir.display(), %err, "Skipping unreadable directory");
                return;
            }
        };
        self.counters.dirs_listed.fetch_add(1, Ordering::Relaxed);

        let descend = self.depth.allows(level + 1);

        for entry in entries {
            if entry.is_pseudo() {
                continue;
            }

            match entry.kind {
                EntryKind::Dir if descend => {
                    let child = dir.join(&entry.name);
                    match tasks.try_acquire() {
                        Some(slot) => {
                            self.counters.spawned_descents.fetch_add(1, Ordering::Relaxed);
                            tasks.spawn(slot, move |tasks| self.list_dir(tasks, &child, level + 1));
                        }
                        None => {
                            self.counters.inline_descents.fetch_add(1, Ordering::Relaxed);
                            self.list_dir(tasks, &child, level + 1);
                        }
                    }
                }
                EntryKind::File => {
                    self.counters.files_visited.fetch_add(1, Ordering::Relaxed);
                    self.visitor.visit(dir, &entry.name);
                }
                EntryKind::Dir | EntryKind::Other => {}
            }
        }
    }
}
