//! pgdbd — the pgdb daemon.
//!
//! Single binary that assembles:
//! - Registry paths under the data directory
//! - Docker CLI runtime adapter
//! - Deploy / destroy / status transactions
//! - REST API with bearer-token auth
//!
//! # Usage
//!
//! ```text
//! PGDB_TOKEN=... pgdbd serve --listen 0.0.0.0:8080 --data-dir /var/lib/pgdb
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pgdb_core::ProvisionPolicy;
use pgdb_runtime::{ContainerRuntime, DockerCli};
use pgdbd::{ServeConfig, prepare};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,pgdbd=debug,pgdb=debug";

#[derive(Parser)]
#[command(name = "pgdbd", about = "pgdb daemon: ephemeral PostgreSQL provisioning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the provisioning API.
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PGDB_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Directory holding the registry and its lock file.
    #[arg(long, env = "PGDB_DATA_DIR", default_value = "/var/lib/pgdb")]
    data_dir: PathBuf,

    /// Host advertised in connection URLs; derived per request when unset.
    #[arg(long, env = "PGDB_PUBLIC_HOST")]
    public_host: Option<String>,

    /// Bearer token clients must present.
    #[arg(long, env = "PGDB_TOKEN", hide_env_values = true)]
    token: String,

    /// Docker-compatible CLI to drive.
    #[arg(long, env = "PGDB_DOCKER_BIN", default_value = "docker")]
    docker_bin: String,

    /// Log JSON lines instead of human-readable text.
    #[arg(long, env = "PGDB_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            init_tracing(args.log_json);
            run_serve(args).await
        }
    }
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("pgdb daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let config = ServeConfig {
        data_dir: args.data_dir,
        public_host: args.public_host,
        token: args.token,
        policy: ProvisionPolicy::default(),
    };
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli::with_program(&args.docker_bin));
    let router = prepare(&config, runtime)?;

    // ── Start API server ───────────────────────────────────────

    info!(addr = %args.listen, "API server starting");

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => {
                    warn!(error = %e, "failed to install Ctrl-C handler");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    info!("pgdb daemon stopped");
    Ok(())
}
