//! Provisioning limits and defaults.

use std::time::Duration;

use crate::error::{ProvisionError, ProvisionResult};

/// Knobs of the deploy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPolicy {
    /// Container-start attempts before giving up on port conflicts.
    pub max_attempts: u32,
    /// How long to wait for a fresh database to accept connections.
    pub ready_timeout: Duration,
    /// Major version used when the request names none (or zero).
    pub default_version: u32,
    pub min_version: u32,
    pub max_version: u32,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            ready_timeout: Duration::from_secs(90),
            default_version: 16,
            min_version: 12,
            max_version: 17,
        }
    }
}

impl ProvisionPolicy {
    /// Apply the default and range check to a requested major version.
    pub fn resolve_version(&self, requested: Option<u32>) -> ProvisionResult<u32> {
        let version = match requested {
            None | Some(0) => self.default_version,
            Some(v) => v,
        };
        if !(self.min_version..=self.max_version).contains(&version) {
            return Err(ProvisionError::InvalidVersion {
                version,
                min: self.min_version,
                max: self.max_version,
            });
        }
        Ok(version)
    }
}
