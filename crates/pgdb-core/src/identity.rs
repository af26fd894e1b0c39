//! Identity and secret generation.
//!
//! Names and credential suffixes are lowercase alphanumerics drawn from the
//! thread-local CSPRNG; passwords are 32 random bytes, base64url-encoded.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{Rng, RngCore};

const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random bytes behind every password.
const PASSWORD_BYTES: usize = 32;

/// Suffix length of generated instance names (`db-xxxxxxxx`).
pub const NAME_SUFFIX_LEN: usize = 8;

/// Suffix length of database and user names (`pg_xxxxxxxxxx`, `u_xxxxxxxxxx`).
pub const CREDENTIAL_SUFFIX_LEN: usize = 10;

/// Prefix shared by the container and volume of every instance.
pub const RESOURCE_PREFIX: &str = "pgdb-";

pub fn random_lower_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| LOWER_ALPHANUMERIC[rng.random_range(0..LOWER_ALPHANUMERIC.len())] as char)
        .collect()
}

/// A fresh password: at least 24 characters, URL-safe.
pub fn random_password() -> String {
    let mut raw = [0u8; PASSWORD_BYTES];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Name used when the caller does not supply one.
pub fn generate_instance_name() -> String {
    format!("db-{}", random_lower_alphanumeric(NAME_SUFFIX_LEN))
}

/// Container and volume name for an instance.
pub fn resource_name(instance: &str) -> String {
    format!("{RESOURCE_PREFIX}{instance}")
}

/// Database credentials, generated once at creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub db: String,
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn generate() -> Self {
        Self {
            db: format!("pg_{}", random_lower_alphanumeric(CREDENTIAL_SUFFIX_LEN)),
            user: format!("u_{}", random_lower_alphanumeric(CREDENTIAL_SUFFIX_LEN)),
            password: random_password(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("db", &self.db)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
