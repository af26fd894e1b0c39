//! DockerCli — runtime adapter that invokes the `docker` binary.
//!
//! Each operation is one `docker` subprocess. Failure output (stderr, then
//! stdout) is carried verbatim in [`RuntimeError::Command`] so the
//! port-conflict classifier can inspect the engine's own message.

use std::ffi::OsString;
use std::process::{Command, Output};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use crate::ready::{READY_POLL_INTERVAL, poll_until_ready};
use crate::{ContainerRuntime, DatabaseSpec};

/// Mount point of the data volume inside the postgres image.
const PGDATA_MOUNT: &str = "/var/lib/postgresql/data";

/// Port postgres listens on inside the container.
const CONTAINER_PORT: u16 = 5432;

/// Container runtime backed by the Docker command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: OsString,
    poll_interval: Duration,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    /// Use `docker` from `$PATH`.
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a specific docker-compatible binary (e.g. `podman`, or an absolute path).
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            poll_interval: READY_POLL_INTERVAL,
        }
    }

    /// Override the readiness poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn output(&self, args: &[String]) -> RuntimeResult<Output> {
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|error| RuntimeError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                error,
            })
    }

    /// Run a docker subcommand, returning trimmed stdout on success.
    fn run(&self, action: &str, args: &[String]) -> RuntimeResult<String> {
        debug!(action, "invoking container runtime");
        let output = self.output(args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        Err(RuntimeError::Command {
            action: action.to_string(),
            output: failure_text(&output),
        })
    }
}

/// Both streams, stderr first, trimmed; falls back to the exit status.
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        output.status.to_string()
    } else {
        text
    }
}

/// Arguments for `docker run` starting a postgres container.
pub fn run_args(spec: &DatabaseSpec) -> Vec<String> {
    vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        spec.container_name.clone(),
        "--restart".into(),
        "unless-stopped".into(),
        "-e".into(),
        format!("POSTGRES_DB={}", spec.db),
        "-e".into(),
        format!("POSTGRES_USER={}", spec.user),
        "-e".into(),
        format!("POSTGRES_PASSWORD={}", spec.password),
        "-v".into(),
        format!("{}:{PGDATA_MOUNT}", spec.volume_name),
        "-p".into(),
        format!("{}:{CONTAINER_PORT}", spec.host_port),
        format!("postgres:{}", spec.version),
    ]
}

/// The container id is the last non-empty stdout line; pull progress or
/// warnings may precede it.
fn container_id_from(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .map(str::to_string)
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl ContainerRuntime for DockerCli {
    fn ensure_available(&self) -> RuntimeResult<()> {
        let version = self
            .run(
                "docker version",
                &args(&["version", "--format", "{{.Server.Version}}"]),
            )
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        info!(server_version = %version, "container runtime available");
        Ok(())
    }

    fn create_volume(&self, name: &str) -> RuntimeResult<()> {
        self.run(
            &format!("create volume {name}"),
            &args(&["volume", "create", name]),
        )?;
        Ok(())
    }

    fn remove_volume(&self, name: &str) -> RuntimeResult<()> {
        self.run(
            &format!("remove volume {name}"),
            &args(&["volume", "rm", name]),
        )?;
        Ok(())
    }

    fn run_database(&self, spec: &DatabaseSpec) -> RuntimeResult<String> {
        let stdout = self.run("docker run", &run_args(spec))?;
        let id = container_id_from(&stdout).ok_or(RuntimeError::EmptyContainerId)?;
        info!(container = %spec.container_name, port = spec.host_port, id = %id, "container started");
        Ok(id)
    }

    fn remove_container(&self, id: &str) -> RuntimeResult<()> {
        match self.run(&format!("remove container {id}"), &args(&["rm", "-f", id])) {
            Ok(_) => Ok(()),
            Err(RuntimeError::Command { output, .. }) if output.contains("No such container") => {
                debug!(id, "container already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn wait_ready(&self, id: &str, user: &str, db: &str, timeout: Duration) -> RuntimeResult<()> {
        let probe_args = args(&["exec", id, "pg_isready", "-U", user, "-d", db]);
        poll_until_ready(timeout, self.poll_interval, || {
            matches!(self.output(&probe_args), Ok(out) if out.status.success())
        })
    }
}
