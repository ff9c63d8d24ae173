//! Bean extraction for the NameNode JMX endpoint.
//!
//! The NameNode serves `/jmx` as one JSON document holding an unordered list
//! of "beans", each a differently-shaped record tagged by its `name`. This
//! crate fetches that document and maps the handful of beans we care about
//! onto gauges in a [`namenode_monitor::MetricsRegistry`].
//!
//! - [`mapping`]: the static table of `(bean, field, metric, coercion)` rows.
//!   Tracking a new quantity is a table edit.
//! - [`bean`]: field resolution and value coercion against a `serde_json::Value`.
//! - [`client`]: the HTTP client used for the upstream GET.
//! - [`extractor`]: one fetch-parse-map cycle, serialized under a lock.

pub mod bean;
pub mod client;
pub mod error;
pub mod extractor;
pub mod mapping;

pub use client::JmxClient;
pub use error::{FetchError, FieldSkip};
pub use extractor::{BeanExtractor, CycleReport};
pub use mapping::{Coercion, FieldMapping, FieldPath, NAMENODE_FIELD_MAPPINGS, NAMESPACE};
