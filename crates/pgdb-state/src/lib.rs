//! pgdb-state — durable registry of provisioned database instances.
//!
//! The registry is a single JSON document (`{"items": [...]}`) on local
//! disk. Every read-modify-write cycle is serialized by an exclusive
//! advisory lock on a sibling lock file.
//!
//! # Architecture
//!
//! ```text
//! RegistryLock::acquire(lock path)     blocks until exclusive
//!   └── store::load(registry path)     missing/empty file => empty registry
//!       └── mutate Registry in memory
//!           └── store::save(...)       temp file + rename (atomic replace)
//! RegistryLock::release()              also runs on drop
//! ```
//!
//! Nothing is cached between operations: callers always lock, then load.

pub mod error;
pub mod lock;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use lock::RegistryLock;
pub use store::{RegistryPaths, RegistryStore, ensure_data_dir, find_by_name, load, save};
pub use types::*;
