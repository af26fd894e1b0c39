//! Runtime adapter error types and failure classification.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for runtime adapter operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors reported by a container runtime adapter.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container runtime not available: {0}")]
    Unavailable(String),

    #[error("failed to launch {program}: {error}")]
    Spawn {
        program: String,
        error: std::io::Error,
    },

    #[error("{action} failed: {output}")]
    Command { action: String, output: String },

    #[error("container runtime returned an empty container id")]
    EmptyContainerId,

    #[error("postgres did not become ready before {0:?}")]
    NotReady(Duration),
}

const PORT_CONFLICT_MARKERS: [&str; 2] = ["port is already allocated", "address already in use"];

/// Classify a failure as a host-port bind conflict.
pub fn is_port_conflict(err: &RuntimeError) -> bool {
    let msg = err.to_string();
    PORT_CONFLICT_MARKERS.iter().any(|marker| msg.contains(marker))
}
