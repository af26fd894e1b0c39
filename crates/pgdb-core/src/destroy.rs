//! Destroyer — the teardown transaction.
//!
//! Removing the container is idempotent so a half-finished teardown can be
//! repeated. A failed volume removal aborts before the registry changes,
//! so the record is never dropped while its data still exists.

use std::sync::Arc;

use pgdb_runtime::ContainerRuntime;
use pgdb_state::{RegistryPaths, RegistryStore};
use tracing::info;

use crate::error::{ProvisionError, ProvisionResult};
use crate::txn::release;

/// Tears down registered database instances.
pub struct Destroyer {
    registry: RegistryStore,
    runtime: Arc<dyn ContainerRuntime>,
}

impl Destroyer {
    pub fn new(paths: RegistryPaths, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            registry: RegistryStore::new(paths),
            runtime,
        }
    }

    /// Remove the instance's container, its volume unless `keep_data`, and
    /// finally its registry entry.
    pub fn destroy(&self, name: &str, keep_data: bool) -> ProvisionResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProvisionError::MissingName);
        }

        let lock = self.registry.lock()?;
        let mut registry = self.registry.load(&lock)?;
        let instance = match registry.find_by_name(name) {
            Some((_, instance)) => instance.clone(),
            None => return Err(ProvisionError::NotFound(name.to_string())),
        };

        self.runtime.remove_container(&instance.container_id)?;
        if !keep_data {
            self.runtime.remove_volume(&instance.volume_name)?;
        }

        registry.remove(name);
        self.registry.save(&lock, &registry)?;
        release(lock);

        info!(%name, keep_data, "database destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use chrono::Utc;
    use pgdb_runtime::{FakeCall, FakeRuntime};
    use pgdb_state::{DbInstance, Registry, store};

    use crate::error::ErrorKind;

    fn instance(name: &str) -> DbInstance {
        DbInstance {
            name: name.to_string(),
            container_id: format!("cid-{name}"),
            volume_name: format!("pgdb-{name}"),
            host: "127.0.0.1".into(),
            host_port: 40000,
            db: "pg_aaaaaaaaaa".into(),
            user: "u_bbbbbbbbbb".into(),
            password: "password-password-password".into(),
            created_at: Utc::now(),
            postgres_version: "16".into(),
            size_gb: None,
        }
    }

    /// A registry holding `names`, with matching live runtime resources.
    fn setup(runtime: FakeRuntime, names: &[&str]) -> (tempfile::TempDir, Arc<FakeRuntime>, Destroyer) {
        let dir = tempfile::tempdir().unwrap();
        let paths = RegistryPaths::in_dir(dir.path());
        let mut registry = Registry::default();
        for name in names {
            let inst = instance(name);
            runtime.seed_container(&inst.container_id);
            runtime.seed_volume(&inst.volume_name);
            registry.items.push(inst);
        }
        store::save(&paths.registry, &registry).unwrap();

        let runtime = Arc::new(runtime);
        let destroyer = Destroyer::new(paths, runtime.clone());
        (dir, runtime, destroyer)
    }

    fn registry_bytes(dir: &tempfile::TempDir) -> Vec<u8> {
        fs::read(dir.path().join("registry.json")).unwrap()
    }

    #[test]
    fn destroy_removes_container_volume_and_entry() {
        let (dir, runtime, destroyer) = setup(FakeRuntime::new(), &["orders", "billing"]);

        destroyer.destroy("orders", false).unwrap();

        assert_eq!(
            runtime.calls(),
            vec![
                FakeCall::RemoveContainer("cid-orders".into()),
                FakeCall::RemoveVolume("pgdb-orders".into()),
            ]
        );
        let registry = store::load(&dir.path().join("registry.json")).unwrap();
        assert!(!registry.contains("orders"));
        assert!(registry.contains("billing"));
        assert_eq!(runtime.live_volumes(), vec!["pgdb-billing".to_string()]);
    }

    #[test]
    fn keep_data_never_touches_volume() {
        let (dir, runtime, destroyer) = setup(FakeRuntime::new(), &["orders"]);

        destroyer.destroy("orders", true).unwrap();

        assert_eq!(runtime.count(|c| matches!(c, FakeCall::RemoveVolume(_))), 0);
        assert_eq!(runtime.live_volumes(), vec!["pgdb-orders".to_string()]);
        assert!(runtime.live_containers().is_empty());
        assert!(store::load(&dir.path().join("registry.json")).unwrap().is_empty());
    }

    #[test]
    fn unknown_name_is_not_found_and_registry_unchanged() {
        let (dir, runtime, destroyer) = setup(FakeRuntime::new(), &["orders"]);
        let before = registry_bytes(&dir);

        let err = destroyer.destroy("missing", false).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(runtime.calls().is_empty());
        assert_eq!(registry_bytes(&dir), before);
    }

    #[test]
    fn blank_name_is_rejected() {
        let (_dir, runtime, destroyer) = setup(FakeRuntime::new(), &[]);
        let err = destroyer.destroy("  ", false).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingName));
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn already_removed_container_is_fine() {
        let (dir, runtime, destroyer) = setup(FakeRuntime::new(), &["orders"]);
        runtime.remove_container("cid-orders").unwrap();

        destroyer.destroy("orders", false).unwrap();
        assert!(store::load(&dir.path().join("registry.json")).unwrap().is_empty());
    }

    #[test]
    fn volume_failure_keeps_the_record() {
        let (dir, _runtime, destroyer) =
            setup(FakeRuntime::new().with_remove_volume_failure("volume is in use"), &["orders"]);
        let before = registry_bytes(&dir);

        let err = destroyer.destroy("orders", false).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(registry_bytes(&dir), before);
    }

    #[test]
    fn container_failure_keeps_the_record() {
        let (dir, runtime, destroyer) =
            setup(FakeRuntime::new().with_remove_container_failure("daemon unreachable"), &["orders"]);
        let before = registry_bytes(&dir);

        assert!(destroyer.destroy("orders", false).is_err());
        assert_eq!(runtime.count(|c| matches!(c, FakeCall::RemoveVolume(_))), 0);
        assert_eq!(registry_bytes(&dir), before);
    }
}
