// Configuration management module
// This file handles loading and parsing of configuration settings
// from a YAML file with environment variable overrides

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::Deserialize;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "NNFCM_EXPORTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listener for the /metrics endpoint
    pub server: ServerConfig,
    /// Shared operatorIdentifier selector sent with every upstream request
    #[serde(default)]
    pub query_params: String,
    /// Per-request upstream timeout; unset keeps the HTTP client default
    pub upstream_timeout_secs: Option<u64>,
    /// Scrapes allowed to run the fetch/publish pipeline at once (default 1)
    pub max_concurrent_scrapes: Option<usize>,
    /// nnfcm-statistics source (optional)
    pub statistics: Option<SourceConfig>,
    /// nnfcm-monitoring source (optional)
    pub monitoring: Option<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    /// Category names queried in this order on every scrape
    #[serde(default)]
    pub categories: Vec<String>,
}

impl SourceConfig {
    /// A source takes part in a scrape only when categories, host and port
    /// are all set.
    pub fn is_active(&self) -> bool {
        !self.categories.is_empty() && !self.address.is_empty() && self.port != 0
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

impl AppConfig {
    /// Read `path` as YAML, then apply `NNFCM__...` environment overrides,
    /// e.g. `NNFCM__SERVER__PORT=9100`.
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(File::new(path, FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("NNFCM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("read config file {path}"))?;
        cfg.try_deserialize()
            .with_context(|| format!("decode config file {path}"))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let raw = format!("{}:{}", self.server.address, self.server.port);
        raw.parse()
            .with_context(|| format!("invalid server bind address: {raw}"))
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    pub fn scrape_concurrency(&self) -> usize {
        self.max_concurrent_scrapes.unwrap_or(1).max(1)
    }
}
