//! HTTP client for the pgdb daemon.

use std::time::Duration;

use anyhow::{Context, bail};
use pgdb_core::{DeployRequest, DeployResult, StatusSnapshot};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Readiness alone may take 90 s, so deploys get a long budget.
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(180);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ApiClient {
    http: Client,
    base: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base: Url, token: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self { http, base, token })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("join {path} onto {}", self.base))
    }

    /// Send with bearer auth; non-2xx responses surface the server's
    /// `error` message.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, timeout: Duration) -> anyhow::Result<T> {
        let resp = req
            .bearer_auth(&self.token)
            .timeout(timeout)
            .send()
            .await
            .context("request to pgdb daemon failed")?;

        let status = resp.status();
        let text = resp.text().await.context("read response body")?;
        if !status.is_success() {
            bail!("request failed ({status}): {}", error_message(&text));
        }
        serde_json::from_str(&text).context("decode response body")
    }

    pub async fn deploy(&self, req: &DeployRequest) -> anyhow::Result<DeployResult> {
        let builder = self.http.post(self.url("/v1/deploy")?).json(req);
        self.send(builder, DEPLOY_TIMEOUT).await
    }

    pub async fn status(&self) -> anyhow::Result<StatusSnapshot> {
        let builder = self.http.get(self.url("/v1/status")?);
        self.send(builder, DEFAULT_TIMEOUT).await
    }

    pub async fn destroy(&self, name: &str, keep_data: bool) -> anyhow::Result<()> {
        let path = destroy_path(name, keep_data);
        let builder = self.http.delete(self.url(&path)?);
        let _: serde_json::Value = self.send(builder, DEFAULT_TIMEOUT).await?;
        Ok(())
    }
}

fn destroy_path(name: &str, keep_data: bool) -> String {
    format!("/v1/db/{}?keep_data={keep_data}", urlencoding::encode(name))
}

/// The `error` field of a JSON error body, or the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
