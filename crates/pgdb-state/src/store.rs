//! Registry store — load/persist the instance list as one JSON document.
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the
//! target, so readers only ever observe a complete snapshot.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::lock::RegistryLock;
use crate::types::{DbInstance, Registry};

/// Convert any `Display` error into a `StateError` variant, prefixed with a path.
macro_rules! map_err {
    ($variant:ident, $path:expr) => {
        |e| StateError::$variant(format!("{}: {}", $path.display(), e))
    };
}

/// File names inside the daemon's data directory.
pub const REGISTRY_FILE: &str = "registry.json";
pub const LOCK_FILE: &str = "registry.lock";

/// Location of the registry document and its lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    pub registry: PathBuf,
    pub lock: PathBuf,
}

impl RegistryPaths {
    pub fn new(registry: impl Into<PathBuf>, lock: impl Into<PathBuf>) -> Self {
        Self {
            registry: registry.into(),
            lock: lock.into(),
        }
    }

    /// Standard layout: `<dir>/registry.json` and `<dir>/registry.lock`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(REGISTRY_FILE), dir.join(LOCK_FILE))
    }
}

/// Create the data directory if it does not exist yet.
pub fn ensure_data_dir(dir: &Path) -> StateResult<()> {
    fs::create_dir_all(dir).map_err(map_err!(Directory, dir))
}

/// Load the registry. A missing or zero-length file is an empty registry.
pub fn load(path: &Path) -> StateResult<Registry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Registry::default()),
        Err(e) => return Err(StateError::Read(format!("{}: {e}", path.display()))),
    };

    if bytes.is_empty() {
        return Ok(Registry::default());
    }

    let registry: Registry = serde_json::from_slice(&bytes).map_err(map_err!(Parse, path))?;
    debug!(path = %path.display(), items = registry.len(), "registry loaded");
    Ok(registry)
}

/// Persist the registry with atomic-replace semantics.
pub fn save(path: &Path, registry: &Registry) -> StateResult<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(map_err!(Directory, dir))?;
    }

    let mut bytes = serde_json::to_vec_pretty(registry)
        .map_err(|e| StateError::Serialize(e.to_string()))?;
    bytes.push(b'\n');

    let tmp = temp_path(path);
    write_private(&tmp, &bytes).map_err(map_err!(Write, tmp))?;
    fs::rename(&tmp, path).map_err(map_err!(Replace, path))?;

    debug!(path = %path.display(), items = registry.len(), "registry saved");
    Ok(())
}

/// Linear scan by name.
pub fn find_by_name<'a>(registry: &'a Registry, name: &str) -> Option<(usize, &'a DbInstance)> {
    registry.find_by_name(name)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// The registry holds credentials, so the file is owner-only.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Registry access bound to a pair of paths. Reads and writes require a
/// held [`RegistryLock`], which keeps lock-then-load ordering explicit at
/// every call site.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    paths: RegistryPaths,
}

impl RegistryStore {
    pub fn new(paths: RegistryPaths) -> Self {
        Self { paths }
    }

    /// Block until the registry lock is held.
    pub fn lock(&self) -> StateResult<RegistryLock> {
        RegistryLock::acquire(&self.paths.lock)
    }

    pub fn load(&self, _held: &RegistryLock) -> StateResult<Registry> {
        load(&self.paths.registry)
    }

    pub fn save(&self, _held: &RegistryLock, registry: &Registry) -> StateResult<()> {
        save(&self.paths.registry, registry)
    }
}
