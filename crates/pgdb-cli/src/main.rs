use clap::{Parser, Subcommand};

mod client;
mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(
    name = "pgdb",
    about = "pgdb — ephemeral PostgreSQL databases on demand",
    version,
)]
struct Cli {
    /// Bearer token for the daemon.
    #[arg(long, env = "PGDB_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new database and print its connection details.
    Deploy {
        /// Instance name (generated when omitted)
        #[arg(long)]
        name: Option<String>,
        /// Advisory size in GB
        #[arg(long)]
        size: Option<u32>,
        /// Postgres major version
        #[arg(long)]
        version: Option<u32>,
        /// Server alias from the config file
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List databases registered on a server.
    Status {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Remove a database's container, and its volume unless --keep-data.
    Destroy {
        name: String,
        /// Keep the data volume
        #[arg(long)]
        keep_data: bool,
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Manage server aliases.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set `server.<alias> <url>` or `default <alias>`
    Set { key: String, value: String },
    /// Print the current configuration
    Get,
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let token = cli.token;

    match cli.command {
        Commands::Deploy {
            name,
            size,
            version,
            server,
            json,
        } => {
            let req = pgdb_core::DeployRequest {
                name,
                size_gb: size,
                version,
            };
            commands::db::deploy(token, server.as_deref(), req, json).await
        }
        Commands::Status { server, json } => {
            commands::db::status(token, server.as_deref(), json).await
        }
        Commands::Destroy {
            name,
            keep_data,
            server,
            json,
        } => commands::db::destroy(token, server.as_deref(), &name, keep_data, json).await,
        Commands::Config { action } => match action {
            ConfigAction::Set { key, value } => commands::config::set(&key, &value),
            ConfigAction::Get => commands::config::get(),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
