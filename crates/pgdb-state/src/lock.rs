//! RegistryLock — exclusive host-local lock over a fixed file path.
//!
//! Acquisition blocks until every other holder (thread or process) has
//! released. There is no timeout: a holder that never releases blocks all
//! later operations. The lock is released explicitly with
//! [`RegistryLock::release`] or implicitly when the handle is dropped, so
//! every exit path of a critical section gives it up.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};

/// Handle proving the caller holds the registry lock.
#[derive(Debug)]
pub struct RegistryLock {
    file: Option<File>,
    path: PathBuf,
}

impl RegistryLock {
    /// Open (creating if needed) the lock file and block until the
    /// exclusive lock is granted.
    pub fn acquire(path: &Path) -> StateResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StateError::Lock(format!("create {}: {e}", parent.display()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StateError::Lock(format!("open {}: {e}", path.display())))?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| StateError::Lock(format!("acquire {}: {e}", path.display())))?;

        debug!(path = %path.display(), "registry lock acquired");
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
        })
    }

    /// Release the lock, surfacing any unlock failure.
    pub fn release(mut self) -> StateResult<()> {
        self.unlock()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unlock(&mut self) -> StateResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        FileExt::unlock(&file)
            .map_err(|e| StateError::Lock(format!("release {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), "registry lock released");
        Ok(())
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            warn!(error = %e, "failed to release registry lock on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn acquire_creates_missing_parent_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.lock");

        let lock = RegistryLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());
        lock.release().unwrap();
    }

    #[test]
    fn uncreatable_parent_is_a_lock_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let err = RegistryLock::acquire(&blocker.join("registry.lock")).unwrap_err();
        assert!(err.is_lock(), "{err}");
    }

    #[test]
    fn reacquire_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        RegistryLock::acquire(&path).unwrap().release().unwrap();
        RegistryLock::acquire(&path).unwrap().release().unwrap();
    }

    #[test]
    fn second_holder_blocks_until_first_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        let first = RegistryLock::acquire(&path).unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let waiter = {
            let path = path.clone();
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let lock = RegistryLock::acquire(&path).unwrap();
                acquired.store(true, Ordering::SeqCst);
                lock.release().unwrap();
            })
        };

        thread::sleep(Duration::from_millis(200));
        assert!(!acquired.load(Ordering::SeqCst), "lock must be exclusive");

        first.release().unwrap();
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn drop_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        {
            let _held = RegistryLock::acquire(&path).unwrap();
        }

        let file = File::open(&path).unwrap();
        FileExt::try_lock_exclusive(&file).unwrap();
        FileExt::unlock(&file).unwrap();
    }
}
