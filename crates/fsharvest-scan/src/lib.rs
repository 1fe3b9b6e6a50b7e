//! Bounded concurrent directory traversal for fsharvest.
//!
//! This crate provides the worker pool and the recursive traverser that the
//! cache index and the save pipeline are built on.
//!
//! # Overview
//!
//! - **Slot-bounded tasks** via [`WorkerPool`]: at most `capacity` tasks are
//!   ever in flight, and every slot is returned when its guard drops
//! - **Inline fallback**: when no slot is free a subdirectory is walked on
//!   the current thread instead of blocking
//! - **Pluggable** filesystem access ([`FileSystem`]) and root enumeration
//!   ([`RootProvider`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use fsharvest_scan::{Depth, LocalFs, Traverser, WorkerPool};
//!
//! let pool = WorkerPool::new(8).unwrap();
//! let traverser = Traverser::new(&pool, &LocalFs);
//!
//! let stats = traverser
//!     .walk(Path::new("/data"), Depth::Limited(2), &|dir: &Path, name: &str| {
//!         println!("{}", dir.join(name).display());
//!     })
//!     .unwrap();
//!
//! println!("Visited {} files", stats.files_visited);
//! ```

mod fs;
mod pool;
mod roots;
mod traverser;

pub use fs::{DirEntry, EntryKind, FileSystem, LocalFs};
pub use pool::{Slot, TaskScope, WorkerPool};
pub use roots::{FixedRoots, RootProvider, SystemRoots};
pub use traverser::{Traverser, Visitor, WalkStats};

// Re-export core types for convenience
pub use fsharvest_core::{Depth, HarvestError, Root};
