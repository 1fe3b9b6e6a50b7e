//! Save pipeline and harvester facade for fsharvest.
//!
//! [`Harvester`] ties together the worker pool, the root provider and the
//! cache index, and exposes the three top-level operations:
//!
//! - [`Harvester::build_cache`] indexes every file under every root
//! - [`Harvester::find_by_name`] lists the directories holding a file name
//! - [`Harvester::save_by_format`] copies every file of the requested
//!   formats into a flattened mirror of its source tree
//!
//! ```rust,no_run
//! use fsharvest_ops::{HarvestConfig, Harvester};
//! use fsharvest_scan::SystemRoots;
//!
//! let mut harvester = Harvester::new(HarvestConfig::default(), SystemRoots).unwrap();
//! let report = harvester.save_by_format([".pdf"], 0, "/tmp/harvest").unwrap();
//! println!("{} files written", report.written);
//! ```

mod harvester;
mod mirror;
mod save;

pub use harvester::Harvester;
pub use mirror::{FLATTEN_SEPARATOR, MirrorLayout};
pub use save::{SavePipeline, SaveReport, SaveStager, WriteOutcome};

// Re-export core types
pub use fsharvest_core::{HarvestConfig, HarvestError, SearchConfig};
