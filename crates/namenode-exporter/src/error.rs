use namenode_jmx::FetchError;
use namenode_monitor::MonitorError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the exporter from starting or serving.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Declaring the gauges failed; the mapping table is inconsistent.
    #[error("metric registry error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("upstream client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
