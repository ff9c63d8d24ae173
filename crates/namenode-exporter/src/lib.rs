//! Prometheus exporter for the HDFS NameNode.
//!
//! Each scrape of the telemetry path triggers one synchronous fetch of the
//! NameNode's `/jmx` document, maps its beans onto gauges, and renders the
//! registry. When the upstream is unreachable or returns garbage the scrape
//! still succeeds with the last known values.
//!
//! - [`config`]: `ExporterConfig`, loaded from TOML with flag overrides.
//! - [`server`]: the axum router, shared state, and graceful shutdown.

pub mod config;
pub mod error;
pub mod server;

pub use config::{ConfigError, ExporterConfig};
pub use error::ExporterError;
pub use server::{router, serve, wait_for_shutdown_signal, AppState};
