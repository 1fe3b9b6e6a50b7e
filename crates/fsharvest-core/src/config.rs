//! Search and harvester configuration types.

use std::collections::BTreeSet;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, HarvestError};
use crate::record::ExtensionKey;

/// Depth value marking a search configuration as unset.
const UNCONFIGURED_DEPTH: i32 = -1;

/// Resolved recursion limit for a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Descend without limit.
    Unlimited,
    /// Descend at most this many directory levels below each root.
    Limited(u32),
}

impl Depth {
    /// Interpret a raw depth level: `0` is unlimited, positive values are a
    /// cap, negative values are the unconfigured sentinel.
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(Self::Unlimited),
            n if n > 0 => Some(Self::Limited(n as u32)),
            _ => None,
        }
    }

    /// Whether directories at `level` below the root may be listed.
    pub fn allows(self, level: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(max) => level <= max,
        }
    }
}

/// Set of requested extensions, normalized on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FormatSet(BTreeSet<ExtensionKey>);

impl FormatSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a format, returning `false` if it was blank or already present.
    pub fn insert(&mut self, format: &str) -> bool {
        match ExtensionKey::parse_format(format) {
            Some(key) => self.0.insert(key),
            None => false,
        }
    }

    /// Whether a file name's extension is one of the requested formats.
    ///
    /// Extensionless files never match.
    pub fn matches_name(&self, name: &str) -> bool {
        let key = ExtensionKey::of_name(name);
        !key.is_undefined() && self.0.contains(&key)
    }

    pub fn contains(&self, key: &ExtensionKey) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FormatSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for format in iter {
            set.insert(format.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for FormatSet {
    fn from(formats: Vec<String>) -> Self {
        formats.into_iter().collect()
    }
}

impl From<FormatSet> for Vec<String> {
    fn from(set: FormatSet) -> Self {
        set.0.into_iter().map(|k| k.as_str().to_string()).collect()
    }
}

/// Configuration for one search/save pass.
///
/// A pass consumes the configuration and leaves it [`unconfigured`]
/// afterwards.
///
/// [`unconfigured`]: SearchConfig::unconfigured
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SearchConfig {
    /// Extensions to collect.
    #[builder(default)]
    #[serde(default)]
    pub formats: FormatSet,

    /// Raw depth level (0 = unlimited, negative = unconfigured).
    #[builder(default = "0")]
    #[serde(default)]
    pub depth: i32,

    /// Directory the mirrored tree is written under.
    #[serde(default)]
    pub output_root: PathBuf,
}

impl SearchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(depth) = self.depth {
            if depth < 0 {
                return Err(format!("Depth must be 0 (unlimited) or positive, got {depth}"));
            }
        }
        match self.output_root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Output root cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Output root is required".to_string()),
        }
    }
}

impl SearchConfig {
    /// Create a new search config builder.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Set every field at once, without validation.
    pub fn configure<I, S>(formats: I, depth: i32, output_root: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            formats: formats.into_iter().collect(),
            depth,
            output_root: output_root.into(),
        }
    }

    /// The empty state a configuration returns to after a pass.
    pub fn unconfigured() -> Self {
        Self {
            formats: FormatSet::new(),
            depth: UNCONFIGURED_DEPTH,
            output_root: PathBuf::new(),
        }
    }

    /// Whether this is still (or again) the unconfigured state.
    pub fn is_unconfigured(&self) -> bool {
        self.depth < 0 && self.formats.is_empty() && self.output_root.as_os_str().is_empty()
    }

    pub fn require_formats(&self) -> Result<&FormatSet, ConfigError> {
        if self.formats.is_empty() {
            Err(ConfigError::NoFormats)
        } else {
            Ok(&self.formats)
        }
    }

    pub fn require_depth(&self) -> Result<Depth, ConfigError> {
        Depth::from_level(self.depth).ok_or(ConfigError::UnconfiguredDepth)
    }

    /// Parse a configuration from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, HarvestError> {
        toml::from_str(input).map_err(|e| HarvestError::ConfigFile {
            message: e.to_string(),
        })
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::unconfigured()
    }
}

/// Configuration for a harvester instance.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct HarvestConfig {
    /// Worker pool capacity; zero is rejected when an operation runs.
    #[builder(default = "default_threads()")]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Build the cache on demand when a name lookup finds none.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub cache_on_lookup: bool,

    /// Serve save passes from the cache when one exists.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub save_from_cache: bool,
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_true() -> bool {
    true
}

impl HarvestConfig {
    /// Create a new harvester config builder.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }

    /// Create a config with the given pool capacity.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            cache_on_lookup: true,
            save_from_cache: true,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::new(default_threads())
    }
}
