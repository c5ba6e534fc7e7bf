// src/config.rs

//! Manages gate configuration: loading, defaults, and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Root credentials, held out-of-band from the user store. The root user is
/// synthesized from this at every registry reload.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RootConfig {
    /// Raw root password; hashed once at gate construction.
    #[serde(default)]
    pub password: String,
    /// Pre-hashed alternative (SHA-256, hex). Takes precedence over
    /// `password`, so the raw secret can stay out of the config file.
    #[serde(default)]
    pub password_sha256: Option<String>,
}

/// Where user records are persisted: a reserved index of the fronted search
/// service.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: Url,
    #[serde(default = "default_store_index")]
    pub index: String,
    /// Per-request timeout for store I/O during reloads and admin writes.
    #[serde(with = "humantime_serde", default = "default_store_timeout")]
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            index: default_store_index(),
            timeout: default_store_timeout(),
        }
    }
}

fn default_store_url() -> Url {
    Url::parse("http://127.0.0.1:9200/").expect("static default URL")
}
fn default_store_index() -> String {
    ".fence_users".to_string()
}
fn default_store_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Literal address allow/deny lists. Range notation must be expanded to
/// literals before it lands here.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IpConfig {
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<IpAddr>,
    #[serde(default)]
    pub denylist: Vec<IpAddr>,
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
            denylist: vec![],
        }
    }
}

fn default_allowlist() -> Vec<IpAddr> {
    vec!["127.0.0.1".parse().expect("static loopback address")]
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Multi-index APIs may name indices inside the request body. When
    /// false, any body carrying an explicit index field is rejected.
    #[serde(default = "default_allow_explicit_index")]
    pub allow_explicit_index: bool,
    #[serde(default)]
    pub root: RootConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ip: IpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_explicit_index: default_allow_explicit_index(),
            root: RootConfig::default(),
            store: StoreConfig::default(),
            ip: IpConfig::default(),
        }
    }
}

fn default_allow_explicit_index() -> bool {
    true
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.store.index.trim().is_empty() {
            return Err(anyhow!("store.index cannot be empty"));
        }
        if self.store.index.contains('/') {
            return Err(anyhow!("store.index cannot contain '/'"));
        }
        if self.store.timeout.is_zero() {
            return Err(anyhow!("store.timeout cannot be zero"));
        }

        if let Some(hash) = &self.root.password_sha256 {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(anyhow!(
                    "root.password_sha256 must be a 64-character hex digest"
                ));
            }
        } else if self.root.password.is_empty() {
            warn!("root.password is empty; root login accepts the empty password");
        }

        Ok(())
    }
}
