//! Core types and configuration for fsharvest.
//!
//! This crate provides the data model shared by the traversal engine, the
//! cache index and the save pipeline: file records, case-folded extension
//! keys, roots, search configuration and the error taxonomy.

mod config;
mod error;
mod record;
mod root;

pub use config::{
    Depth, FormatSet, HarvestConfig, HarvestConfigBuilder, SearchConfig, SearchConfigBuilder,
};
pub use error::{ConfigError, HarvestError};
pub use record::{ExtensionKey, FileContent, FileRecord, UNDEFINED_EXTENSION};
pub use root::Root;
