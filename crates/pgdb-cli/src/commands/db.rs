use anyhow::Context;
use pgdb_core::DeployRequest;

use crate::client::ApiClient;
use crate::config::CliConfig;
use crate::output;

fn connect(token: Option<String>, server: Option<&str>) -> anyhow::Result<ApiClient> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .context("PGDB_TOKEN is not set")?;
    let config = CliConfig::load()?;
    let (alias, url) = config.resolve_server(server)?;
    tracing::debug!(%alias, %url, "using server");
    ApiClient::new(url, token)
}

pub async fn deploy(
    token: Option<String>,
    server: Option<&str>,
    req: DeployRequest,
    json: bool,
) -> anyhow::Result<()> {
    let client = connect(token, server)?;
    let result = client.deploy(&req).await?;
    output::print_deploy(&result, json)
}

pub async fn status(token: Option<String>, server: Option<&str>, json: bool) -> anyhow::Result<()> {
    let client = connect(token, server)?;
    let snapshot = client.status().await?;
    output::print_status(&snapshot, json)
}

pub async fn destroy(
    token: Option<String>,
    server: Option<&str>,
    name: &str,
    keep_data: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = connect(token, server)?;
    client.destroy(name, keep_data).await?;
    output::print_destroy(name, json)
}
