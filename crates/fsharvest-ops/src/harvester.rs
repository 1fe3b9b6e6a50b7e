//! The harvester facade: one pool, one root provider, one optional cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use fsharvest_core::{ConfigError, HarvestConfig, HarvestError, Root, SearchConfig};
use fsharvest_index::CacheIndex;
use fsharvest_scan::{FileSystem, LocalFs, RootProvider, Traverser, WorkerPool};

use crate::mirror::MirrorLayout;
use crate::save::{SavePipeline, SaveReport, SaveStager};

/// Entry point for indexing and saving.
///
/// A harvester owns its worker pool for its whole lifetime and keeps the
/// last built [`CacheIndex`], which later lookups and saves reuse.
pub struct Harvester {
    config: HarvestConfig,
    roots: Box<dyn RootProvider>,
    fs: Arc<dyn FileSystem>,
    pool: WorkerPool,
    search: SearchConfig,
    cache: Option<CacheIndex>,
}

impl Harvester {
    /// Create a harvester over the local filesystem.
    pub fn new(
        config: HarvestConfig,
        roots: impl RootProvider + 'static,
    ) -> Result<Self, HarvestError> {
        Self::with_fs(config, roots, Arc::new(LocalFs))
    }

    /// Create a harvester over a custom [`FileSystem`].
    pub fn with_fs(
        config: HarvestConfig,
        roots: impl RootProvider + 'static,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, HarvestError> {
        let pool = WorkerPool::new(config.threads)?;
        Ok(Self {
            config,
            roots: Box::new(roots),
            fs,
            pool,
            search: SearchConfig::unconfigured(),
            cache: None,
        })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The pending search configuration.
    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Replace the pending search configuration.
    pub fn configure(&mut self, search: SearchConfig) {
        self.search = search;
    }

    /// The cache index, if one has been built.
    pub fn cache(&self) -> Option<&CacheIndex> {
        self.cache.as_ref()
    }

    /// Walk every root without a depth limit and replace the cache.
    pub fn build_cache(&mut self) -> Result<&CacheIndex, HarvestError> {
        let roots = self.enumerate_roots()?;
        self.pool.ensure_usable()?;

        let traverser = Traverser::new(&self.pool, self.fs.as_ref());
        let index = CacheIndex::build(&traverser, &roots)?;
        Ok(self.cache.insert(index))
    }

    /// Directories containing a file named exactly `name`.
    ///
    /// Builds the cache first if there is none and
    /// [`HarvestConfig::cache_on_lookup`] is set; otherwise an empty result
    /// is returned.
    pub fn find_by_name(&mut self, name: &str) -> Result<Vec<PathBuf>, HarvestError> {
        let start = Instant::now();

        if self.cache.is_none() {
            if !self.config.cache_on_lookup {
                debug!(name, "No cache to search");
                return Ok(Vec::new());
            }
            self.build_cache()?;
        }

        let found = self
            .cache
            .as_ref()
            .map(|cache| cache.lookup(name))
            .unwrap_or_default();
        debug!(
            name,
            matches = found.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Lookup finished"
        );
        Ok(found)
    }

    /// Configure a pass and save every matching file into a mirrored tree
    /// under `output_root`.
    ///
    /// `depth` is `0` for unlimited, positive for a limit and negative for
    /// unconfigured (rejected).
    pub fn save_by_format<I, S>(
        &mut self,
        formats: I,
        depth: i32,
        output_root: impl AsRef<Path>,
    ) -> Result<SaveReport, HarvestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.configure(SearchConfig::configure(
            formats,
            depth,
            output_root.as_ref(),
        ));
        self.save()
    }

    /// Run a save pass with the pending configuration.
    ///
    /// The configuration is reset to unconfigured whether or not the pass
    /// succeeds.
    pub fn save(&mut self) -> Result<SaveReport, HarvestError> {
        let search = std::mem::take(&mut self.search);
        self.run_save(&search)
    }

    fn run_save(&self, search: &SearchConfig) -> Result<SaveReport, HarvestError> {
        let start = Instant::now();

        let formats = search.require_formats()?;
        let roots = self.enumerate_roots()?;
        let depth = search.require_depth()?;
        self.pool.ensure_usable()?;

        let fs = self.fs.as_ref();
        let layout = MirrorLayout::new(&search.output_root, &roots);
        layout.prepare(fs)?;

        let stager = SaveStager::new(formats, fs);
        let (walk, from_cache) = match self.cache.as_ref() {
            Some(cache) if self.config.save_from_cache => {
                let records = formats.iter().flat_map(|ext| cache.records_for(ext));
                stager.stage_cached(&self.pool, records)?;
                (None, true)
            }
            _ => {
                let traverser = Traverser::new(&self.pool, fs);
                (Some(traverser.walk_roots(&roots, depth, &stager)?), false)
            }
        };

        let read_failures = stager.read_failures();
        let staged = stager.into_staged();
        let staged_count = staged.len() as u64;

        let outcome = SavePipeline::new(&self.pool, fs, &layout).write_all(staged)?;

        let report = SaveReport {
            staged: staged_count,
            written: outcome.written,
            failed: outcome.failed,
            read_failures,
            bytes_written: outcome.bytes_written,
            walk,
            from_cache,
            elapsed: start.elapsed(),
        };

        info!(
            formats = formats.len(),
            staged = report.staged,
            written = report.written,
            failed = report.failed,
            from_cache,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Save finished"
        );
        Ok(report)
    }

    fn enumerate_roots(&self) -> Result<Vec<Root>, HarvestError> {
        let roots = self.roots.roots()?;
        if roots.is_empty() {
            return Err(ConfigError::NoRoots.into());
        }
        Ok(roots)
    }
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("search", &self.search)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
