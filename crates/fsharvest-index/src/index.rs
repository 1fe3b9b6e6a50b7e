//! Extension-keyed file index.
//!
//! The index is built in two phases:
//! 1. A full, unbounded traversal inserts every file into a sharded
//!    concurrent map keyed by extension
//! 2. Once the walk has joined, the map is frozen and each bucket is sorted
//!    (and de-duplicated) in parallel
//!
//! Lookups only ever see the frozen, sorted form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use fsharvest_core::{Depth, ExtensionKey, FileRecord, HarvestError, Root};
use fsharvest_scan::{Traverser, Visitor, WalkStats};

/// Visitor that records every visited file under its extension.
#[derive(Debug, Default)]
pub struct CacheInserter {
    buckets: DashMap<ExtensionKey, Vec<FileRecord>>,
}

impl CacheInserter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the collected records into a sorted index.
    pub fn into_index(self, walk: WalkStats) -> CacheIndex {
        let start = Instant::now();
        let mut buckets: HashMap<ExtensionKey, Vec<FileRecord>> =
            self.buckets.into_iter().collect();

        buckets.par_iter_mut().for_each(|(_, records)| {
            records.sort_unstable();
            records.dedup();
        });

        let records = buckets.values().map(Vec::len).sum();
        CacheIndex {
            stats: IndexStats {
                extensions: buckets.len(),
                records,
                walk,
                sort_time: start.elapsed(),
            },
            buckets,
        }
    }
}

impl Visitor for CacheInserter {
    fn visit(&self, dir: &Path, name: &str) {
        self.buckets
            .entry(ExtensionKey::of_name(name))
            .or_default()
            .push(FileRecord::new(dir, name));
    }
}

/// Statistics about a built index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    /// Number of distinct extension keys.
    pub extensions: usize,
    /// Number of records across all buckets.
    pub records: usize,
    /// Counters of the traversal that produced the index.
    pub walk: WalkStats,
    /// Time spent sorting buckets after the walk.
    pub sort_time: Duration,
}

/// Number of indexed files for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCount {
    pub extension: ExtensionKey,
    pub files: usize,
}

/// In-memory index of every file under a set of roots, keyed by extension.
#[derive(Debug, Clone)]
pub struct CacheIndex {
    buckets: HashMap<ExtensionKey, Vec<FileRecord>>,
    stats: IndexStats,
}

impl CacheIndex {
    /// Walk every root without a depth limit and index all files found.
    pub fn build(traverser: &Traverser<'_>, roots: &[Root]) -> Result<Self, HarvestError> {
        let inserter = CacheInserter::new();
        let walk = traverser.walk_roots(roots, Depth::Unlimited, &inserter)?;
        let index = inserter.into_index(walk);

        info!(
            extensions = index.stats.extensions,
            records = index.stats.records,
            elapsed_ms = index.elapsed().as_millis() as u64,
            "Cache built"
        );
        Ok(index)
    }

    /// Directories containing a file named exactly `name`.
    ///
    /// Only the bucket for `name`'s extension is searched.
    pub fn lookup(&self, name: &str) -> Vec<PathBuf> {
        let bucket = self.records_for(&ExtensionKey::of_name(name));
        let start = bucket.partition_point(|r| r.name.as_str() < name);
        bucket[start..]
            .iter()
            .take_while(|r| r.name.as_str() == name)
            .map(|r| r.path.clone())
            .collect()
    }

    /// All records with the given extension, sorted.
    pub fn records_for(&self, extension: &ExtensionKey) -> &[FileRecord] {
        self.buckets
            .get(extension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Per-extension file counts, largest first.
    pub fn extension_counts(&self) -> Vec<ExtensionCount> {
        let mut counts: Vec<ExtensionCount> = self
            .buckets
            .iter()
            .map(|(extension, records)| ExtensionCount {
                extension: extension.clone(),
                files: records.len(),
            })
            .collect();
        counts.sort_by(|a, b| {
            b.files
                .cmp(&a.files)
                .then_with(|| a.extension.cmp(&b.extension))
        });
        counts
    }

    /// Total number of indexed files.
    pub fn len(&self) -> usize {
        self.stats.records
    }

    pub fn is_empty(&self) -> bool {
        self.stats.records == 0
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Total time to walk and sort.
    pub fn elapsed(&self) -> Duration {
        self.stats.walk.elapsed + self.stats.sort_time
    }
}

impl PartialEq for CacheIndex {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl Eq for CacheIndex {}
