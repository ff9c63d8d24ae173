//! Configuration for the exporter service.
//!
//! Every field has a default, so an empty or partial TOML file is valid.
//! Command-line flags are applied on top by the binary.

use namenode_logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings of the scrape endpoint and its upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address the metrics endpoint listens on. `:9070` means all interfaces.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Path under which metrics are exposed.
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,

    /// NameNode JMX URL scraped on every request.
    #[serde(default = "default_jmx_url")]
    pub jmx_url: String,

    /// Deadline of the upstream GET, in seconds.
    #[serde(default = "default_scrape_timeout", with = "secs_f64")]
    pub scrape_timeout: Duration,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_listen_address() -> String {
    ":9070".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

fn default_jmx_url() -> String {
    "http://localhost:50070/jmx".to_string()
}

fn default_scrape_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
            jmx_url: default_jmx_url(),
            scrape_timeout: default_scrape_timeout(),
            log: LogConfig::default(),
        }
    }
}

impl ExporterConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_address.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_address is empty".into()));
        }
        if !self.telemetry_path.starts_with('/') || self.telemetry_path == "/" {
            return Err(ConfigError::Invalid(format!(
                "telemetry_path must be an absolute path other than \"/\", got {:?}",
                self.telemetry_path
            )));
        }
        // Route syntax would make the router treat the path as a pattern.
        if self.telemetry_path.contains(['*', ':', '{', '}']) {
            return Err(ConfigError::Invalid(format!(
                "telemetry_path must be a literal path, got {:?}",
                self.telemetry_path
            )));
        }
        if !(self.jmx_url.starts_with("http://") || self.jmx_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "jmx_url must be an http(s) URL, got {:?}",
                self.jmx_url
            )));
        }
        if self.scrape_timeout.is_zero() {
            return Err(ConfigError::Invalid("scrape_timeout must be positive".into()));
        }
        Ok(())
    }

    /// Listen address in a form `TcpListener::bind` accepts.
    pub fn bind_address(&self) -> String {
        let addr = self.listen_address.trim();
        if addr.starts_with(':') {
            format!("0.0.0.0{}", addr)
        } else {
            addr.to_string()
        }
    }
}

mod secs_f64 {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
