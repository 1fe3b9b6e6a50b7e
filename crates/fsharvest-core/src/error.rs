//! Error types for harvesting operations.

use std::path::PathBuf;

use thiserror::Error;

/// Precondition failures detected before any I/O takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No file formats were requested.
    #[error("No file formats configured")]
    NoFormats,

    /// The root provider returned an empty set.
    #[error("No filesystem roots available")]
    NoRoots,

    /// Depth is still at the unconfigured sentinel.
    #[error("Search depth is not configured")]
    UnconfiguredDepth,

    /// The worker pool was created with zero capacity.
    #[error("Worker pool capacity must be positive")]
    InvalidPoolCapacity,
}

impl ConfigError {
    /// Status code reported to callers for this precondition failure.
    pub fn code(self) -> i32 {
        match self {
            Self::NoFormats => -1,
            Self::NoRoots => -2,
            Self::UnconfiguredDepth => -3,
            Self::InvalidPoolCapacity => -4,
        }
    }
}

/// Errors that abort a whole harvesting operation.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A precondition was not met.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The root provider could not enumerate roots.
    #[error("Failed to enumerate filesystem roots: {message}")]
    RootEnumeration { message: String },

    /// A required output directory could not be created.
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker threads could not be started.
    #[error("Failed to start worker pool: {message}")]
    ThreadPool { message: String },

    /// A configuration file could not be parsed.
    #[error("Invalid configuration file: {message}")]
    ConfigFile { message: String },
}

impl HarvestError {
    /// Create a root enumeration error.
    pub fn root_enumeration(message: impl Into<String>) -> Self {
        Self::RootEnumeration {
            message: message.into(),
        }
    }

    /// Negative status code for this error.
    ///
    /// `-1..=-4` are the configuration codes, `-5` root enumeration,
    /// `-6` output preparation, `-7` anything else.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Config(err) => err.code(),
            Self::RootEnumeration { .. } => -5,
            Self::OutputDir { .. } => -6,
            _ => -7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_codes_are_distinct() {
        let codes = [
            ConfigError::NoFormats.code(),
            ConfigError::NoRoots.code(),
            ConfigError::UnconfiguredDepth.code(),
            ConfigError::InvalidPoolCapacity.code(),
        ];
        assert_eq!(codes, [-1, -2, -3, -4]);
    }

    #[test]
    fn test_status_code_passthrough() {
        let err: HarvestError = ConfigError::UnconfiguredDepth.into();
        assert_eq!(err.status_code(), -3);
        assert_eq!(HarvestError::root_enumeration("no drives").status_code(), -5);
    }

    #[test]
    fn test_every_variant_has_a_status_code() {
        let output = HarvestError::OutputDir {
            path: PathBuf::from("/out"),
            source: std::io::Error::other("read-only"),
        };
        assert_eq!(output.status_code(), -6);
        assert!(output.to_string().contains("/out"));

        let pool = HarvestError::ThreadPool {
            message: "spawn failed".to_string(),
        };
        let file = HarvestError::ConfigFile {
            message: "bad toml".to_string(),
        };
        assert_eq!(pool.status_code(), -7);
        assert_eq!(file.status_code(), -7);
    }
}
