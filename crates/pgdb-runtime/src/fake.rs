//! FakeRuntime — scripted in-memory runtime for tests.
//!
//! Records every call, tracks which containers and volumes are live, and
//! can be scripted to fail specific steps.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::{RuntimeError, RuntimeResult};
use crate::{ContainerRuntime, DatabaseSpec};

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    EnsureAvailable,
    CreateVolume(String),
    RemoveVolume(String),
    RunDatabase { container: String, port: u16 },
    RemoveContainer(String),
    WaitReady(String),
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<FakeCall>,
    /// Container ids and names currently believed to exist.
    containers: BTreeSet<String>,
    volumes: BTreeSet<String>,
    next_id: u32,
    port_conflicts: u32,
    run_failure: Option<String>,
    create_volume_failure: Option<String>,
    remove_volume_failure: Option<String>,
    remove_container_failure: Option<String>,
    never_ready: bool,
    unavailable: bool,
    ready_delay: Option<Duration>,
}

/// Deterministic [`ContainerRuntime`] for tests.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    inner: Mutex<Inner>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` container starts fail with a port-already-allocated error.
    pub fn with_port_conflicts(self, n: u32) -> Self {
        self.lock().port_conflicts = n;
        self
    }

    /// Every container start fails with this (non-port) message.
    pub fn with_run_failure(self, message: &str) -> Self {
        self.lock().run_failure = Some(message.to_string());
        self
    }

    pub fn with_create_volume_failure(self, message: &str) -> Self {
        self.lock().create_volume_failure = Some(message.to_string());
        self
    }

    pub fn with_remove_volume_failure(self, message: &str) -> Self {
        self.lock().remove_volume_failure = Some(message.to_string());
        self
    }

    pub fn with_remove_container_failure(self, message: &str) -> Self {
        self.lock().remove_container_failure = Some(message.to_string());
        self
    }

    /// Databases never report ready; `wait_ready` fails immediately.
    pub fn never_ready(self) -> Self {
        self.lock().never_ready = true;
        self
    }

    pub fn unavailable(self) -> Self {
        self.lock().unavailable = true;
        self
    }

    /// Sleep inside `wait_ready`, to widen races in concurrency tests.
    pub fn with_ready_delay(self, delay: Duration) -> Self {
        self.lock().ready_delay = Some(delay);
        self
    }

    /// Pretend a container already exists (e.g. one registered earlier).
    pub fn seed_container(&self, id: &str) {
        self.lock().containers.insert(id.to_string());
    }

    pub fn seed_volume(&self, name: &str) {
        self.lock().volumes.insert(name.to_string());
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Host ports passed to every container start, in order.
    pub fn run_ports(&self) -> Vec<u16> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::RunDatabase { port, .. } => Some(*port),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&FakeCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_containers(&self) -> Vec<String> {
        self.lock().containers.iter().cloned().collect()
    }

    pub fn live_volumes(&self) -> Vec<String> {
        self.lock().volumes.iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn command_failure(action: &str, message: &str) -> RuntimeError {
    RuntimeError::Command {
        action: action.to_string(),
        output: message.to_string(),
    }
}

impl ContainerRuntime for FakeRuntime {
    fn ensure_available(&self) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(FakeCall::EnsureAvailable);
        if inner.unavailable {
            return Err(RuntimeError::Unavailable("fake runtime is down".to_string()));
        }
        Ok(())
    }

    fn create_volume(&self, name: &str) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(FakeCall::CreateVolume(name.to_string()));
        if let Some(msg) = &inner.create_volume_failure {
            return Err(command_failure(&format!("create volume {name}"), msg));
        }
        inner.volumes.insert(name.to_string());
        Ok(())
    }

    fn remove_volume(&self, name: &str) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(FakeCall::RemoveVolume(name.to_string()));
        if let Some(msg) = &inner.remove_volume_failure {
            return Err(command_failure(&format!("remove volume {name}"), msg));
        }
        if !inner.volumes.remove(name) {
            return Err(command_failure(
                &format!("remove volume {name}"),
                &format!("Error response from daemon: get {name}: no such volume"),
            ));
        }
        Ok(())
    }

    fn run_database(&self, spec: &DatabaseSpec) -> RuntimeResult<String> {
        let mut inner = self.lock();
        inner.calls.push(FakeCall::RunDatabase {
            container: spec.container_name.clone(),
            port: spec.host_port,
        });

        if inner.port_conflicts > 0 {
            inner.port_conflicts -= 1;
            // The engine leaves a created-but-unstarted container behind.
            inner.containers.insert(spec.container_name.clone());
            return Err(command_failure(
                "docker run",
                &format!(
                    "Bind for 0.0.0.0:{} failed: port is already allocated",
                    spec.host_port
                ),
            ));
        }
        if let Some(msg) = &inner.run_failure {
            return Err(command_failure("docker run", msg));
        }

        inner.next_id += 1;
        let id = format!("fake-{:04}", inner.next_id);
        inner.containers.insert(id.clone());
        Ok(id)
    }

    fn remove_container(&self, id: &str) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(FakeCall::RemoveContainer(id.to_string()));
        if let Some(msg) = &inner.remove_container_failure {
            return Err(command_failure(&format!("remove container {id}"), msg));
        }
        inner.containers.remove(id);
        Ok(())
    }

    fn wait_ready(&self, id: &str, _user: &str, _db: &str, timeout: Duration) -> RuntimeResult<()> {
        let delay = {
            let mut inner = self.lock();
            inner.calls.push(FakeCall::WaitReady(id.to_string()));
            if inner.never_ready {
                return Err(RuntimeError::NotReady(timeout));
            }
            inner.ready_delay
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        Ok(())
    }
}
