//! Deployer — the create transaction.
//!
//! 1. Validate the request (name, version) without side effects.
//! 2. Take the registry lock and load the registry; reject duplicates.
//! 3. Generate credentials and derive resource names and the public host.
//! 4. Provision under a bounded retry policy: reserve a port, create the
//!    volume, start the container, wait for readiness. Only a host-port
//!    conflict at container start is retried.
//! 5. Append the record and persist; a failed commit removes the container
//!    and volume again.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use pgdb_runtime::{ContainerRuntime, DatabaseSpec};
use pgdb_state::{DbInstance, RegistryPaths, RegistryStore};
use tracing::{info, warn};

use crate::error::{ProvisionError, ProvisionResult};
use crate::identity::{Credentials, resource_name};
use crate::network::{derive_host, reserve_port};
use crate::policy::ProvisionPolicy;
use crate::request::{DeployRequest, resolve_name};
use crate::retry::{RetryError, RetryPolicy};
use crate::rollback::Rollback;
use crate::txn::release;
use crate::views::DeployResult;

/// Runtime resources that came up in one successful attempt, plus what it
/// takes to remove them again.
struct Provisioned<'a> {
    container_id: String,
    host_port: u16,
    rollback: Rollback<'a>,
}

/// Provisions new database instances.
pub struct Deployer {
    registry: RegistryStore,
    runtime: Arc<dyn ContainerRuntime>,
    public_host: Option<String>,
    policy: ProvisionPolicy,
}

impl Deployer {
    pub fn new(paths: RegistryPaths, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            registry: RegistryStore::new(paths),
            runtime,
            public_host: None,
            policy: ProvisionPolicy::default(),
        }
    }

    /// Host advertised to clients instead of the one derived per request.
    pub fn with_public_host(mut self, host: Option<String>) -> Self {
        self.public_host = host.filter(|h| !h.trim().is_empty());
        self
    }

    pub fn with_policy(mut self, policy: ProvisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Provision one instance. `request_host` is the inbound `Host` value,
    /// used when no public host is configured.
    pub fn deploy(&self, req: &DeployRequest, request_host: &str) -> ProvisionResult<DeployResult> {
        let name = resolve_name(req.name.as_deref())?;
        let version = self.policy.resolve_version(req.version)?;

        let lock = self.registry.lock()?;
        let mut registry = self.registry.load(&lock)?;
        if registry.contains(&name) {
            return Err(ProvisionError::Conflict(name));
        }

        let credentials = Credentials::generate();
        let resource = resource_name(&name);
        let template = DatabaseSpec {
            container_name: resource.clone(),
            volume_name: resource,
            host_port: 0,
            db: credentials.db,
            user: credentials.user,
            password: credentials.password,
            version: version.to_string(),
        };
        let host = derive_host(self.public_host.as_deref(), request_host);
        let created_at = Utc::now().trunc_subsecs(0);

        info!(%name, version, %host, "deploying database");

        let retry = RetryPolicy::new(self.policy.max_attempts, ProvisionError::is_retryable);
        let provisioned = retry
            .run(|attempt| self.provision_attempt(attempt, &template))
            .map_err(|e| match e {
                RetryError::Fatal(e) => e,
                RetryError::Exhausted { attempts, last } => ProvisionError::RetriesExhausted {
                    attempts,
                    cause: Box::new(last),
                },
            })?;

        let instance = DbInstance {
            name,
            container_id: provisioned.container_id,
            volume_name: template.volume_name,
            host,
            host_port: provisioned.host_port,
            db: template.db,
            user: template.user,
            password: template.password,
            created_at,
            postgres_version: version.to_string(),
            size_gb: req.size_gb.filter(|&gb| gb > 0),
        };
        registry.items.push(instance.clone());

        if let Err(e) = self.registry.save(&lock, &registry) {
            warn!(name = %instance.name, error = %e, "registry commit failed; removing container and volume");
            provisioned.rollback.unwind();
            return Err(e.into());
        }
        provisioned.rollback.commit();
        release(lock);

        info!(
            name = %instance.name,
            port = instance.host_port,
            container = %instance.container_id,
            "database deployed"
        );
        Ok(DeployResult::from(&instance))
    }

    /// One pass through port reservation, volume, container and readiness.
    /// Anything this attempt created is removed before it returns an error.
    fn provision_attempt(
        &self,
        attempt: u32,
        template: &DatabaseSpec,
    ) -> ProvisionResult<Provisioned<'_>> {
        let runtime = self.runtime.as_ref();
        let host_port = reserve_port()?;
        let spec = DatabaseSpec {
            host_port,
            ..template.clone()
        };

        runtime.create_volume(&spec.volume_name)?;
        let mut rollback = Rollback::new(runtime);
        rollback.remove_volume(&spec.volume_name);

        let container_id = match runtime.run_database(&spec) {
            Ok(id) => id,
            Err(e) if runtime.is_port_conflict(&e) => {
                warn!(attempt, port = host_port, "host port already allocated");
                // The engine keeps the created container, which holds both
                // the name and the volume.
                rollback.remove_container(&spec.container_name);
                rollback.unwind();
                return Err(ProvisionError::PortConflict {
                    port: host_port,
                    cause: e,
                });
            }
            Err(e) => {
                rollback.unwind();
                return Err(e.into());
            }
        };
        rollback.remove_container(&container_id);

        if let Err(e) = runtime.wait_ready(
            &container_id,
            &spec.user,
            &spec.db,
            self.policy.ready_timeout,
        ) {
            warn!(container = %container_id, error = %e, "database never became ready");
            rollback.unwind();
            return Err(e.into());
        }

        Ok(Provisioned {
            container_id,
            host_port,
            rollback,
        })
    }
}
