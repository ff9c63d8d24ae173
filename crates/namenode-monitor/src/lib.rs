//! Metric registry for the NameNode exporter.
//!
//! Holds the fixed set of gauges the bean extractor writes into and renders
//! them in the Prometheus text exposition format.

pub mod error;
pub mod metrics;
pub mod registry;
pub mod sample;

pub use error::MonitorError;
pub use metrics::Gauge;
pub use registry::MetricsRegistry;
pub use sample::Sample;
