//! Deploy request and name validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, ProvisionResult};
use crate::identity::generate_instance_name;

/// Lowercase letter, then 2 to 62 lowercase letters, digits or hyphens.
pub const NAME_PATTERN: &str = "^[a-z][a-z0-9-]{2,62}$";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("name pattern is a valid regex"));

/// Body of a deploy call. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Advisory size hint in GB.
    #[serde(default, alias = "size_hint", skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u32>,
    /// Postgres major version; absent or zero means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Validate a caller-chosen name, or generate one when none is given.
///
/// Surrounding whitespace is ignored and letters are lowercased before the
/// pattern check.
pub fn resolve_name(raw: Option<&str>) -> ProvisionResult<String> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(generate_instance_name());
    }

    let name = trimmed.to_lowercase();
    if !NAME_RE.is_match(&name) {
        return Err(ProvisionError::InvalidName {
            name: trimmed.to_string(),
            pattern: NAME_PATTERN,
        });
    }
    Ok(name)
}
