//! Compensating actions for partially provisioned resources.
//!
//! Each created resource registers the action that undoes it. On failure
//! the actions run in reverse creation order; a failing action is logged
//! and the rest still run. Nothing here changes the error the caller
//! returns.

use pgdb_runtime::ContainerRuntime;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    RemoveContainer(String),
    RemoveVolume(String),
}

/// Pending undo steps for one provisioning attempt.
pub struct Rollback<'a> {
    runtime: &'a dyn ContainerRuntime,
    actions: Vec<Compensation>,
}

impl<'a> Rollback<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime) -> Self {
        Self {
            runtime,
            actions: Vec::new(),
        }
    }

    /// Force-remove this container (id or name) if the transaction fails.
    pub fn remove_container(&mut self, container: &str) {
        self.actions
            .push(Compensation::RemoveContainer(container.to_string()));
    }

    /// Remove this volume if the transaction fails.
    pub fn remove_volume(&mut self, volume: &str) {
        self.actions.push(Compensation::RemoveVolume(volume.to_string()));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every pending action, newest first. Returns how many failed.
    pub fn unwind(self) -> usize {
        let mut failed = 0;
        for action in self.actions.into_iter().rev() {
            let result = match &action {
                Compensation::RemoveContainer(id) => self.runtime.remove_container(id),
                Compensation::RemoveVolume(name) => self.runtime.remove_volume(name),
            };
            match result {
                Ok(()) => debug!(?action, "rolled back"),
                Err(e) => {
                    failed += 1;
                    warn!(?action, error = %e, "rollback step failed; resource may be orphaned");
                }
            }
        }
        failed
    }

    /// The transaction committed; forget the pending actions.
    pub fn commit(self) {
        debug!(discarded = self.actions.len(), "rollback disarmed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgdb_runtime::{FakeCall, FakeRuntime};

    #[test]
    fn unwind_runs_in_reverse_order() {
        let runtime = FakeRuntime::new();
        runtime.seed_volume("pgdb-a");
        runtime.seed_container("cid-a");

        let mut rollback = Rollback::new(&runtime);
        rollback.remove_volume("pgdb-a");
        rollback.remove_container("cid-a");
        assert_eq!(rollback.len(), 2);
        assert_eq!(rollback.unwind(), 0);

        assert_eq!(
            runtime.calls(),
            vec![
                FakeCall::RemoveContainer("cid-a".into()),
                FakeCall::RemoveVolume("pgdb-a".into()),
            ]
        );
        assert!(runtime.live_containers().is_empty());
        assert!(runtime.live_volumes().is_empty());
    }

    #[test]
    fn failing_step_does_not_stop_the_rest() {
        let runtime = FakeRuntime::new().with_remove_container_failure("daemon hiccup");
        runtime.seed_volume("pgdb-a");

        let mut rollback = Rollback::new(&runtime);
        rollback.remove_volume("pgdb-a");
        rollback.remove_container("cid-a");

        assert_eq!(rollback.unwind(), 1);
        assert!(runtime.live_volumes().is_empty());
    }

    #[test]
    fn commit_runs_nothing() {
        let runtime = FakeRuntime::new();
        let mut rollback = Rollback::new(&runtime);
        rollback.remove_volume("pgdb-a");
        rollback.commit();
        assert!(runtime.calls().is_empty());
    }
}
