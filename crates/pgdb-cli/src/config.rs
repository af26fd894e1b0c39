//! CLI configuration: named daemon URLs and which one is the default.
//!
//! Stored as JSON at `$HOME/.config/pgdb/config.json`:
//!
//! ```json
//! { "defaultServer": "default", "servers": { "default": "http://10.0.0.5:8080" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALIAS: &str = "default";

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    #[serde(default = "default_alias")]
    pub default_server: String,
    #[serde(default)]
    pub servers: BTreeMap<String, String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_server: default_alias(),
            servers: BTreeMap::new(),
        }
    }
}

pub fn default_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".config").join("pgdb").join("config.json"))
}

impl CliConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&default_path()?)
    }

    /// A missing or blank file is the default configuration.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        if config.default_server.trim().is_empty() {
            config.default_server = default_alias();
        }
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("write {}", path.display()))
    }

    /// Apply `server.<alias> <url>` or `default <alias>`.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if let Some(alias) = key.strip_prefix("server.") {
            if alias.is_empty() {
                bail!("alias cannot be empty");
            }
            validate_url(value)?;
            self.servers.insert(alias.to_string(), value.to_string());
            if alias == DEFAULT_ALIAS {
                self.default_server = default_alias();
            }
            return Ok(());
        }
        if key == "default" {
            if !self.servers.contains_key(value) {
                bail!("server alias '{value}' is not configured");
            }
            self.default_server = value.to_string();
            return Ok(());
        }
        bail!("unsupported key '{key}' (expected server.<alias> or default)")
    }

    /// URL for `alias`, or for the default server when none is given.
    pub fn resolve_server(&self, alias: Option<&str>) -> anyhow::Result<(String, Url)> {
        let alias = alias.unwrap_or(&self.default_server);
        let Some(url) = self.servers.get(alias) else {
            bail!(
                "server alias '{alias}' is not configured. Run: pgdb config set server.{alias} <url>"
            );
        };
        Ok((alias.to_string(), validate_url(url)?))
    }
}

fn validate_url(value: &str) -> anyhow::Result<Url> {
    let url = Url::parse(value).with_context(|| format!("invalid url '{value}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("url must use http or https: {value}");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());

        fs::write(&path, "  \n").unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"defaultServer":""}"#).unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.default_server, "default");
        assert!(config.servers.is_empty());
    }

    #[test]
    fn save_writes_camel_case_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = CliConfig::default();
        config.set("server.default", "http://10.0.0.5:8080").unwrap();
        config.save_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"defaultServer\""));
        assert_eq!(CliConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn set_rejects_bad_keys_and_urls() {
        let mut config = CliConfig::default();
        assert!(config.set("server.", "http://a").is_err());
        assert!(config.set("server.prod", "not a url").is_err());
        assert!(config.set("server.prod", "ftp://host").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.set("default", "prod").is_err());
        assert!(config.servers.is_empty());
    }

    #[test]
    fn default_alias_selects_server() {
        let mut config = CliConfig::default();
        config.set("server.prod", "https://pg.example.com").unwrap();
        config.set("default", "prod").unwrap();

        let (alias, url) = config.resolve_server(None).unwrap();
        assert_eq!(alias, "prod");
        assert_eq!(url.host_str(), Some("pg.example.com"));
    }

    #[test]
    fn unknown_alias_explains_fix() {
        let config = CliConfig::default();
        let err = config.resolve_server(Some("staging")).unwrap_err();
        assert!(err.to_string().contains("pgdb config set server.staging"));
    }
}
