use parking_lot::RwLock;
use prometheus::{Encoder, Opts, TextEncoder};
use std::sync::Arc;

use crate::error::MonitorError;
use crate::metrics::Gauge;
use crate::sample::Sample;

/// Owns the exporter's gauges and renders them for scraping.
///
/// Gauges are declared once at startup and live as long as the registry.
/// Declaration order is kept so `snapshot` is stable across calls.
pub struct MetricsRegistry {
    namespace: Option<String>,
    registry: prometheus::Registry,
    gauges: RwLock<Vec<Arc<Gauge>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            namespace: None,
            registry: prometheus::Registry::new(),
            gauges: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry that prefixes every declared name with `<namespace>_`.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::new()
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Fully-qualified name a gauge declared as `name` ends up with.
    pub fn qualified_name(&self, name: &str) -> String {
        match self.namespace {
            Some(ref ns) if !ns.is_empty() => format!("{}_{}", ns, name),
            _ => name.to_string(),
        }
    }

    /// Register a new gauge.
    ///
    /// Fails with [`MonitorError::DuplicateMetric`] if the qualified name is
    /// already taken, which callers treat as a startup-time programming error.
    pub fn declare(&self, name: &str, help: &str) -> Result<Arc<Gauge>, MonitorError> {
        let qualified = self.qualified_name(name);

        // Held across the check and the registration so two declarations of
        // the same name cannot both succeed.
        let mut gauges = self.gauges.write();
        if gauges.iter().any(|g| g.name() == qualified) {
            return Err(MonitorError::DuplicateMetric(qualified));
        }

        let mut opts = Opts::new(name, help);
        if let Some(ref ns) = self.namespace {
            opts = opts.namespace(ns.clone());
        }
        let inner = prometheus::Gauge::with_opts(opts).map_err(|e| MonitorError::InvalidMetric {
            name: qualified.clone(),
            message: e.to_string(),
        })?;

        self.registry
            .register(Box::new(inner.clone()))
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => MonitorError::DuplicateMetric(qualified.clone()),
                other => MonitorError::InvalidMetric {
                    name: qualified.clone(),
                    message: other.to_string(),
                },
            })?;

        let gauge = Arc::new(Gauge::new(qualified, help.to_string(), inner));
        gauges.push(gauge.clone());
        Ok(gauge)
    }

    /// Look up a declared gauge by its fully-qualified name.
    pub fn get(&self, qualified_name: &str) -> Option<Arc<Gauge>> {
        self.gauges
            .read()
            .iter()
            .find(|g| g.name() == qualified_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.gauges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.read().is_empty()
    }

    /// Current `(name, help, value)` of every gauge, in declaration order.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.gauges
            .read()
            .iter()
            .map(|g| Sample::new(g.name(), g.help(), g.get()))
            .collect()
    }

    /// Encode every gauge in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, MonitorError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MonitorError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MonitorError::Encode(e.to_string()))
    }

    /// Content type of the text produced by [`render`](Self::render).
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
