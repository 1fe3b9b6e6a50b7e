//! In-memory extension index for fsharvest.
//!
//! A [`CacheIndex`] maps every case-folded extension to the sorted list of
//! files carrying it, so repeated name lookups only scan one bucket:
//!
//! ```rust,no_run
//! use fsharvest_index::CacheIndex;
//! use fsharvest_scan::{LocalFs, Root, Traverser, WorkerPool};
//!
//! let pool = WorkerPool::new(8).unwrap();
//! let traverser = Traverser::new(&pool, &LocalFs);
//! let roots = vec![Root::new("home", "/home")];
//!
//! let index = CacheIndex::build(&traverser, &roots).unwrap();
//! for dir in index.lookup("Cargo.toml") {
//!     println!("{}", dir.display());
//! }
//! ```

mod index;

pub use index::{CacheIndex, CacheInserter, ExtensionCount, IndexStats};

// Re-export core types
pub use fsharvest_core::{ExtensionKey, FileRecord};
