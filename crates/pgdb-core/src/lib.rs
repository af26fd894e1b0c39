//! pgdb-core — provisioning and teardown transactions.
//!
//! Every operation follows the same shape: validate, take the registry
//! lock, load the registry, drive the container runtime, persist, release.
//! The lock is held for the whole operation, so deploy, destroy and status
//! are strictly serialized against each other.
//!
//! # Architecture
//!
//! ```text
//! Deployer ──┬── RegistryStore + RegistryLock (pgdb-state)
//! Destroyer ─┤
//! Status ────┘
//!     │
//!     ├── ContainerRuntime (pgdb-runtime)
//!     ├── RetryPolicy      bounded loop, port conflicts only
//!     ├── Rollback         compensating removals, reverse order
//!     └── identity         names, credentials, passwords
//! ```

pub mod deploy;
pub mod destroy;
pub mod error;
pub mod identity;
pub mod network;
pub mod policy;
pub mod request;
pub mod retry;
pub mod rollback;
pub mod status;
mod txn;
pub mod views;

pub use deploy::Deployer;
pub use destroy::Destroyer;
pub use error::{ErrorKind, ProvisionError, ProvisionResult};
pub use policy::ProvisionPolicy;
pub use request::DeployRequest;
pub use retry::{RetryError, RetryPolicy};
pub use status::StatusService;
pub use views::{DeployResult, InstanceView, StatusSnapshot, connection_url};
