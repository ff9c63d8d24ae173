/// A point-in-time f64 reading with static name and help text.
///
/// Backed by a `prometheus::Gauge`, so `set` and `get` are lock-free and a
/// reader never observes a torn value.
pub struct Gauge {
    name: String,
    help: String,
    inner: prometheus::Gauge,
}

impl Gauge {
    pub(crate) fn new(name: String, help: String, inner: prometheus::Gauge) -> Self {
        Self { name, help, inner }
    }

    /// Overwrite the current value.
    pub fn set(&self, value: f64) {
        debug_assert!(value.is_finite(), "gauge {} set to {}", self.name, value);
        self.inner.set(value);
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }

    /// Fully-qualified name, including the registry namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

impl std::fmt::Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge")
            .field("name", &self.name)
            .field("value", &self.get())
            .finish()
    }
}
