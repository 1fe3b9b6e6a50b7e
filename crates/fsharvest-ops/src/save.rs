//! Format-filtered save pipeline.
//!
//! Saving happens in two phases. First a [`SaveStager`] collects the bytes
//! of every matching file, either as a traversal visitor or from cached
//! records. Once every read has joined, a [`SavePipeline`] drains the staged
//! buffer and writes each file into its mirrored directory, one pool task
//! per file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, trace};

use fsharvest_core::{FileContent, FileRecord, FormatSet, HarvestError};
use fsharvest_scan::{FileSystem, Visitor, WalkStats, WorkerPool};

use crate::mirror::MirrorLayout;

/// Outcome of one save pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Files whose bytes were read and queued for writing.
    pub staged: u64,
    /// Files written to the mirrored tree.
    pub written: u64,
    /// Files that could not be placed or written.
    pub failed: u64,
    /// Matching files that could not be read.
    pub read_failures: u64,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Traversal counters, absent when records came from the cache.
    pub walk: Option<WalkStats>,
    /// Whether records came from the cache index.
    pub from_cache: bool,
    pub elapsed: Duration,
}

/// Collects the contents of files whose extension is in a [`FormatSet`].
pub struct SaveStager<'a> {
    formats: &'a FormatSet,
    fs: &'a dyn FileSystem,
    staged: Mutex<Vec<FileContent>>,
    read_failures: AtomicU64,
}

impl<'a> SaveStager<'a> {
    pub fn new(formats: &'a FormatSet, fs: &'a dyn FileSystem) -> Self {
        Self {
            formats,
            fs,
            staged: Mutex::new(Vec::new()),
            read_failures: AtomicU64::new(0),
        }
    }

    /// Read cached records on the pool, one task per record when a slot is
    /// free and inline otherwise.
    ///
    /// Records are taken as given; the caller selects the buckets.
    pub fn stage_cached<'r, I>(&self, pool: &WorkerPool, records: I) -> Result<(), HarvestError>
    where
        I: IntoIterator<Item = &'r FileRecord>,
    {
        pool.scope(|tasks| {
            for record in records {
                tasks.spawn_or_inline(move |_| self.stage(record.clone()));
            }
        })
    }

    /// Number of matching files that could not be read.
    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }

    /// Staged contents, sorted by record with duplicates removed.
    pub fn into_staged(self) -> Vec<FileContent> {
        let mut staged = self
            .staged
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        staged.par_sort_unstable_by(|a, b| a.record.cmp(&b.record));
        staged.dedup_by(|a, b| a.record == b.record);
        staged
    }

    fn stage(&self, record: FileRecord) {
        let path = record.full_path();
        match self.fs.read(&path) {
            Ok(data) => {
                trace!(path = %path.display(), bytes = data.len(), "Staged");
                self.staged
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(FileContent::new(record, data));
            }
            Err(err) => {
                self.read_failures.fetch_add(1, Ordering::Relaxed);
                debug!(path = %path.display(), %err, "Failed to read file");
            }
        }
    }
}

impl Visitor for SaveStager<'_> {
    fn visit(&self, dir: &Path, name: &str) {
        if self.formats.matches_name(name) {
            self.stage(FileRecord::new(dir, name));
        }
    }
}

/// Counters from the write phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub written: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

#[derive(Debug, Default)]
struct WriteCounters {
    written: AtomicU64,
    failed: AtomicU64,
    bytes_written: AtomicU64,
}

/// Writes staged files into a [`MirrorLayout`].
pub struct SavePipeline<'a> {
    pool: &'a WorkerPool,
    fs: &'a dyn FileSystem,
    layout: &'a MirrorLayout,
}

impl<'a> SavePipeline<'a> {
    pub fn new(pool: &'a WorkerPool, fs: &'a dyn FileSystem, layout: &'a MirrorLayout) -> Self {
        Self { pool, fs, layout }
    }

    /// Write every staged file, one task per file.
    ///
    /// The calling thread blocks for a slot before each launch. Per-file
    /// failures are counted, never returned.
    pub fn write_all(&self, staged: Vec<FileContent>) -> Result<WriteOutcome, HarvestError> {
        let counters = WriteCounters::default();
        let counters = &counters;

        self.pool.scope(|tasks| {
            for content in staged {
                let slot = tasks.acquire();
                tasks.spawn(slot, move |_| self.write_one(content, counters));
            }
        })?;

        Ok(WriteOutcome {
            written: counters.written.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            bytes_written: counters.bytes_written.load(Ordering::Relaxed),
        })
    }

    fn write_one(&self, content: FileContent, counters: &WriteCounters) {
        let FileContent { record, data } = content;

        let Some(dir) = self.layout.target_dir(record.dir()) else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            debug!(dir = %record.dir().display(), "No root contains directory");
            return;
        };

        if let Err(err) = self.fs.create_dir_all(&dir) {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            debug!(dir = %dir.display(), %err, "Failed to create mirrored directory");
            return;
        }

        let target = dir.join(record.name.as_str());
        match self.fs.write(&target, &data) {
            Ok(()) => {
                counters.written.fetch_add(1, Ordering::Relaxed);
                counters
                    .bytes_written
                    .fetch_add(data.len() as u64, Ordering::Relaxed);
                trace!(path = %target.display(), "Written");
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                debug!(path = %target.display(), %err, "Failed to write file");
            }
        }
    }
}
