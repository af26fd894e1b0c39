//! pgdb-runtime — boundary over the container engine.
//!
//! [`ContainerRuntime`] is the capability the orchestration core drives:
//! create/remove storage volumes, start/remove database containers and
//! wait for readiness. Failures are classified so the caller can tell a
//! host-port bind conflict (retryable) from everything else (fatal).
//!
//! Implementations:
//! - [`DockerCli`] shells out to the `docker` binary.
//! - `FakeRuntime` (feature `testing`) is a scripted, call-recording
//!   adapter for tests that must not need a live engine.

pub mod docker;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod ready;

use std::fmt;
use std::time::Duration;

pub use docker::DockerCli;
pub use error::{RuntimeError, RuntimeResult, is_port_conflict};
#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeCall, FakeRuntime};

/// Everything needed to start one postgres container.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub container_name: String,
    pub volume_name: String,
    pub host_port: u16,
    pub db: String,
    pub user: String,
    pub password: String,
    /// Postgres major version used as the image tag.
    pub version: String,
}

impl fmt::Debug for DatabaseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSpec")
            .field("container_name", &self.container_name)
            .field("volume_name", &self.volume_name)
            .field("host_port", &self.host_port)
            .field("db", &self.db)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}

/// Container engine operations used by provisioning and teardown.
///
/// All calls block the calling thread; callers on an async executor run
/// them on a blocking pool.
pub trait ContainerRuntime: Send + Sync {
    /// Fail unless the engine is reachable.
    fn ensure_available(&self) -> RuntimeResult<()>;

    fn create_volume(&self, name: &str) -> RuntimeResult<()>;

    fn remove_volume(&self, name: &str) -> RuntimeResult<()>;

    /// Start a database container and return its id.
    fn run_database(&self, spec: &DatabaseSpec) -> RuntimeResult<String>;

    /// Force-remove a container. Removing an absent container succeeds.
    fn remove_container(&self, id: &str) -> RuntimeResult<()>;

    /// Block until the database accepts connections for `user`/`db`, or
    /// fail once `timeout` has elapsed.
    fn wait_ready(&self, id: &str, user: &str, db: &str, timeout: Duration) -> RuntimeResult<()>;

    /// Whether a failure means the requested host port was already bound.
    fn is_port_conflict(&self, err: &RuntimeError) -> bool {
        is_port_conflict(err)
    }
}
