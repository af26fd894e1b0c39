//! pgdbd startup: the checks and wiring that run before the daemon binds.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use axum::Router;
use pgdb_api::{ApiState, BearerToken, build_router};
use pgdb_core::ProvisionPolicy;
use pgdb_runtime::ContainerRuntime;
use pgdb_state::{RegistryPaths, ensure_data_dir};
use tracing::info;

/// Daemon settings that shape the router.
#[derive(Clone)]
pub struct ServeConfig {
    pub data_dir: PathBuf,
    pub public_host: Option<String>,
    pub token: String,
    pub policy: ProvisionPolicy,
}

/// Refuse to start on an empty token, an unusable data directory or an
/// unavailable container runtime; otherwise build the API router.
pub fn prepare(config: &ServeConfig, runtime: Arc<dyn ContainerRuntime>) -> anyhow::Result<Router> {
    let token = config.token.trim();
    if token.is_empty() {
        bail!("PGDB_TOKEN must not be empty");
    }

    ensure_data_dir(&config.data_dir)
        .with_context(|| format!("prepare data dir {}", config.data_dir.display()))?;
    let paths = RegistryPaths::in_dir(&config.data_dir);
    info!(registry = %paths.registry.display(), "registry location");

    runtime
        .ensure_available()
        .context("container runtime is not available")?;

    if let Some(host) = &config.public_host {
        info!(%host, "advertising public host");
    }
    let state = ApiState::new(
        paths,
        runtime,
        config.public_host.clone(),
        config.policy.clone(),
    );
    Ok(build_router(state, BearerToken::new(token)))
}
