//! Orchestration error types.

use pgdb_runtime::RuntimeError;
use pgdb_state::StateError;
use thiserror::Error;

/// Result type alias for deploy/destroy/status operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Errors surfaced by the Deployer, Destroyer and Status projection.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid name '{name}' (must match {pattern})")]
    InvalidName { name: String, pattern: &'static str },

    #[error("version must be between {min} and {max}, got {version}")]
    InvalidVersion { version: u32, min: u32, max: u32 },

    #[error("database name is required")]
    MissingName,

    #[error("database name '{0}' already exists")]
    Conflict(String),

    #[error("database '{0}' not found")]
    NotFound(String),

    #[error("reserve free port: {0}")]
    PortReservation(std::io::Error),

    /// The engine's message is part of the rendering, so `cause` is not
    /// also exposed as the error source.
    #[error("host port {port} is already allocated: {cause}")]
    PortConflict { port: u16, cause: RuntimeError },

    #[error("failed to allocate host port after {attempts} attempts: {cause}")]
    RetriesExhausted {
        attempts: u32,
        cause: Box<ProvisionError>,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Failure classes callers act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was touched.
    Validation,
    /// Duplicate name; nothing was touched.
    Conflict,
    NotFound,
    /// Port conflicts outlasted the attempt budget.
    RetriesExhausted,
    /// Runtime, port probing or registry I/O failed.
    Infrastructure,
    /// The registry lock could not be taken or given back.
    Lock,
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. } | Self::InvalidVersion { .. } | Self::MissingName => {
                ErrorKind::Validation
            }
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::State(e) if e.is_lock() => ErrorKind::Lock,
            Self::PortReservation(_)
            | Self::PortConflict { .. }
            | Self::Runtime(_)
            | Self::State(_) => ErrorKind::Infrastructure,
        }
    }

    /// Only a host-port bind conflict during container start is retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PortConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn kinds() {
        assert_eq!(ProvisionError::MissingName.kind(), ErrorKind::Validation);
        assert_eq!(ProvisionError::Conflict("a".into()).kind(), ErrorKind::Conflict);
        assert_eq!(ProvisionError::NotFound("a".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            ProvisionError::State(StateError::Lock("boom".into())).kind(),
            ErrorKind::Lock
        );
        assert_eq!(
            ProvisionError::State(StateError::Write("disk full".into())).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            ProvisionError::Runtime(RuntimeError::NotReady(Duration::from_secs(90))).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn exhausted_message_wraps_last_cause() {
        let last = ProvisionError::PortConflict {
            port: 41000,
            cause: RuntimeError::Command {
                action: "docker run".into(),
                output: "port is already allocated".into(),
            },
        };
        assert!(last.is_retryable());

        let err = ProvisionError::RetriesExhausted {
            attempts: 5,
            cause: Box::new(last),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        let msg = err.to_string();
        assert!(msg.contains("after 5 attempts"));
        assert!(msg.contains("port is already allocated"));
    }

    #[test]
    fn chained_rendering_names_engine_message_once() {
        let err = ProvisionError::RetriesExhausted {
            attempts: 5,
            cause: Box::new(ProvisionError::PortConflict {
                port: 41000,
                cause: RuntimeError::Command {
                    action: "docker run".into(),
                    output: "port is already allocated".into(),
                },
            }),
        };

        let mut rendered = err.to_string();
        let mut next = std::error::Error::source(&err);
        while let Some(cause) = next {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            next = cause.source();
        }
        assert_eq!(rendered.matches("port is already allocated").count(), 1);
    }
}
