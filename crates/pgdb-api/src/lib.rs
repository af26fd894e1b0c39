//! pgdb-api — REST API for the database provisioner.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/v1/deploy` | Provision a database |
//! | GET | `/v1/status` | List registered databases |
//! | DELETE | `/v1/db/{name}?keep_data=true` | Tear a database down |
//! | GET | `/healthz` | Liveness, no auth |
//!
//! Every `/v1` route requires `Authorization: Bearer <token>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use pgdb_core::{Deployer, Destroyer, ProvisionPolicy, StatusService};
use pgdb_runtime::ContainerRuntime;
use pgdb_state::RegistryPaths;

pub use auth::BearerToken;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub deployer: Arc<Deployer>,
    pub destroyer: Arc<Destroyer>,
    pub status: Arc<StatusService>,
}

impl ApiState {
    /// Wire the three transactions over one registry and one runtime.
    pub fn new(
        paths: RegistryPaths,
        runtime: Arc<dyn ContainerRuntime>,
        public_host: Option<String>,
        policy: ProvisionPolicy,
    ) -> Self {
        let deployer = Deployer::new(paths.clone(), runtime.clone())
            .with_public_host(public_host)
            .with_policy(policy);
        Self {
            deployer: Arc::new(deployer),
            destroyer: Arc::new(Destroyer::new(paths.clone(), runtime)),
            status: Arc::new(StatusService::new(paths)),
        }
    }
}

/// Build the complete API router.
pub fn build_router(state: ApiState, token: BearerToken) -> Router {
    let api_routes = Router::new()
        .route("/deploy", post(handlers::deploy))
        .route("/status", get(handlers::status))
        .route("/db/{name}", delete(handlers::destroy))
        .route_layer(axum::middleware::from_fn_with_state(
            token,
            auth::require_bearer,
        ))
        .with_state(state);

    Router::new()
        .nest("/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
