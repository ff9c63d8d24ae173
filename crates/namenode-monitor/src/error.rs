use thiserror::Error;

/// Errors raised by the metric registry.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A gauge with this fully-qualified name was already declared.
    #[error("metric already declared: {0}")]
    DuplicateMetric(String),

    /// The name or help text was rejected by the exposition format.
    #[error("invalid metric {name}: {message}")]
    InvalidMetric { name: String, message: String },

    /// Rendering the registry into text failed.
    #[error("failed to encode metrics: {0}")]
    Encode(String),
}
