//! Domain types for the registry.
//!
//! These types are the persisted state of every provisioned database
//! instance. Field names are the on-disk JSON keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Registry ──────────────────────────────────────────────────────

/// The full registry snapshot. Insertion order is the only ordering
/// guarantee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Registry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<DbInstance>,
}

impl Registry {
    /// Linear scan for an instance by name. Returns its index and record.
    pub fn find_by_name(&self, name: &str) -> Option<(usize, &DbInstance)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.name == name)
    }

    /// Whether an instance with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Remove the instance with this name, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<DbInstance> {
        let (idx, _) = self.find_by_name(name)?;
        Some(self.items.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `{"items": null}` is treated the same as a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<DbInstance>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<DbInstance>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Instance ──────────────────────────────────────────────────────

/// One provisioned database: identity, runtime handles, endpoint,
/// credentials and metadata. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbInstance {
    /// Unique within the registry.
    pub name: String,
    /// Opaque handle understood only by the container runtime.
    pub container_id: String,
    /// Opaque handle understood only by the container runtime.
    pub volume_name: String,
    /// Externally visible host callers connect to.
    pub host: String,
    pub host_port: u16,
    pub db: String,
    pub user: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    /// Postgres major version, e.g. `"16"`.
    pub postgres_version: String,
    /// Advisory size hint in GB; not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u32>,
}
