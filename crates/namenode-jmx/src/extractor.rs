//! One fetch-parse-map cycle against the NameNode.

use namenode_monitor::{Gauge, MetricsRegistry, MonitorError, Sample};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bean::{bean_name, coerce, resolve, value_kind};
use crate::client::JmxClient;
use crate::error::FetchError;
use crate::mapping::{mappings_for, FieldMapping, NAMENODE_FIELD_MAPPINGS};

/// What a successful cycle did. Skips are counted, not reported as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Elements in the `beans` list.
    pub beans_seen: usize,
    /// Elements that were not an object or had no string `name`.
    pub beans_skipped: usize,
    /// Beans named by at least one mapping row.
    pub beans_matched: usize,
    pub fields_updated: usize,
    pub fields_skipped: usize,
}

/// Maps the `/jmx` document onto the registry's gauges.
///
/// Every gauge named in the mapping table is declared up front. A cycle
/// either fails before touching any gauge (transport, decode, shape) or
/// applies every update it could resolve. Gauges whose source bean or field
/// was absent keep their previous value.
pub struct BeanExtractor {
    registry: Arc<MetricsRegistry>,
    client: JmxClient,
    table: &'static [FieldMapping],
    /// Gauge for each table row, same index.
    targets: Vec<Arc<Gauge>>,
    /// Serializes fetch+mutate so overlapping scrapes never interleave writes.
    cycle: Mutex<()>,
}

impl BeanExtractor {
    /// Declare the NameNode gauges in `registry`.
    pub fn new(registry: Arc<MetricsRegistry>, client: JmxClient) -> Result<Self, MonitorError> {
        Self::with_table(registry, client, NAMENODE_FIELD_MAPPINGS)
    }

    pub fn with_table(
        registry: Arc<MetricsRegistry>,
        client: JmxClient,
        table: &'static [FieldMapping],
    ) -> Result<Self, MonitorError> {
        let targets = table
            .iter()
            .map(|m| registry.declare(m.metric, m.help))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(gauges = targets.len(), "declared bean gauges");

        Ok(Self {
            registry,
            client,
            table,
            targets,
            cycle: Mutex::new(()),
        })
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Fetch `endpoint` and update the gauges from its beans.
    pub async fn refresh(&self, endpoint: &str) -> Result<CycleReport, FetchError> {
        let _cycle = self.cycle.lock().await;
        let body = self.client.fetch(endpoint).await?;
        self.apply_locked(&body)
    }

    /// Same as [`refresh`](Self::refresh) for a body that was already fetched.
    pub async fn apply_document(&self, body: &[u8]) -> Result<CycleReport, FetchError> {
        let _cycle = self.cycle.lock().await;
        self.apply_locked(body)
    }

    /// Gauge values as of the last completed cycle.
    pub async fn snapshot(&self) -> Vec<Sample> {
        let _cycle = self.cycle.lock().await;
        self.registry.snapshot()
    }

    /// Render the registry in the Prometheus text format.
    pub async fn render(&self) -> Result<String, MonitorError> {
        let _cycle = self.cycle.lock().await;
        self.registry.render()
    }

    fn apply_locked(&self, body: &[u8]) -> Result<CycleReport, FetchError> {
        let (updates, report) = self.plan(body)?;
        for (idx, value) in updates {
            self.targets[idx].set(value);
        }
        tracing::debug!(
            beans = report.beans_seen,
            matched = report.beans_matched,
            updated = report.fields_updated,
            skipped = report.fields_skipped,
            "bean cycle applied"
        );
        Ok(report)
    }

    /// Work out every `(row, value)` update without touching the registry.
    ///
    /// Updates are in list order, so a bean name that appears twice ends up
    /// with the later bean's values once applied.
    fn plan(&self, body: &[u8]) -> Result<(Vec<(usize, f64)>, CycleReport), FetchError> {
        let document: Value = serde_json::from_slice(body)?;

        let top = document.as_object().ok_or_else(|| {
            FetchError::Shape(format!(
                "top-level document is {}, expected object",
                value_kind(&document)
            ))
        })?;

        let beans = match top.get("beans") {
            Some(Value::Array(beans)) => beans,
            Some(other) => {
                return Err(FetchError::Shape(format!(
                    "`beans` is {}, expected array",
                    value_kind(other)
                )))
            }
            None => return Err(FetchError::Shape("missing top-level `beans` field".into())),
        };

        let mut report = CycleReport {
            beans_seen: beans.len(),
            ..CycleReport::default()
        };
        let mut updates = Vec::new();

        for (position, element) in beans.iter().enumerate() {
            let Some(bean) = element.as_object() else {
                report.beans_skipped += 1;
                tracing::debug!(position, kind = value_kind(element), "skipping non-object bean");
                continue;
            };
            let Some(name) = bean_name(bean) else {
                report.beans_skipped += 1;
                tracing::debug!(position, "skipping bean without a string name");
                continue;
            };

            let mut matched = false;
            for (idx, mapping) in mappings_for(self.table, name) {
                matched = true;
                match resolve(bean, &mapping.path).and_then(|v| coerce(v, mapping.coercion)) {
                    Ok(value) => {
                        updates.push((idx, value));
                        report.fields_updated += 1;
                    }
                    Err(reason) => {
                        report.fields_skipped += 1;
                        tracing::warn!(
                            bean = name,
                            field = %mapping.path,
                            metric = mapping.metric,
                            %reason,
                            "skipping bean field"
                        );
                    }
                }
            }
            if matched {
                report.beans_matched += 1;
            }
        }

        Ok((updates, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_TIMEOUT;
    use crate::mapping::{FieldMapping, FS_NAMESYSTEM_BEAN, NAMESPACE};
    use serde_json::json;

    const FIXTURE: &str = include_str!("../tests/fixtures/namenode_jmx.json");

    fn extractor() -> BeanExtractor {
        let registry = Arc::new(MetricsRegistry::with_namespace(NAMESPACE));
        let client = JmxClient::new(DEFAULT_TIMEOUT).unwrap();
        BeanExtractor::new(registry, client).unwrap()
    }

    fn value(extractor: &BeanExtractor, metric: &str) -> f64 {
        extractor
            .registry()
            .get(&format!("{}_{}", NAMESPACE, metric))
            .unwrap_or_else(|| panic!("gauge {} not declared", metric))
            .get()
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_declares_every_table_metric() {
        let ex = extractor();
        assert_eq!(ex.registry().len(), NAMENODE_FIELD_MAPPINGS.len());
        assert!(ex.snapshot().await.iter().all(|s| s.value == 0.0));
    }

    #[tokio::test]
    async fn test_fixture_document() {
        let ex = extractor();
        let report = ex.apply_document(FIXTURE.as_bytes()).await.unwrap();

        assert_eq!(report.beans_matched, 5);
        assert_eq!(report.fields_updated, NAMENODE_FIELD_MAPPINGS.len());
        assert_eq!(report.fields_skipped, 0);

        assert_eq!(value(&ex, "CapacityTotal"), 307099828224.0);
        assert_eq!(value(&ex, "CapacityUsed"), 1471291392.0);
        assert_eq!(value(&ex, "CapacityRemaining"), 279994568704.0);
        assert_eq!(value(&ex, "CapacityUsedNonDFS"), 25633968128.0);
        assert_eq!(value(&ex, "BlocksTotal"), 67.0);
        assert_eq!(value(&ex, "FilesTotal"), 184.0);
        assert_eq!(value(&ex, "isActive"), 1.0);
        assert_eq!(value(&ex, "state"), 1.0);
        assert_eq!(value(&ex, "lastHATransitionTime"), 1484149009998.0);
        assert_eq!(value(&ex, "ParNew_CollectionCount"), 12.0);
        assert_eq!(value(&ex, "ParNew_CollectionTime"), 345.0);
        assert_eq!(value(&ex, "ConcurrentMarkSweep_CollectionCount"), 2.0);
        assert_eq!(value(&ex, "ConcurrentMarkSweep_CollectionTime"), 98.0);
        assert_eq!(value(&ex, "heapMemoryUsageCommitted"), 1060372480.0);
        assert_eq!(value(&ex, "heapMemoryUsageInit"), 1073741824.0);
        assert_eq!(value(&ex, "heapMemoryUsageMax"), 1060372480.0);
        assert_eq!(value(&ex, "heapMemoryUsageUsed"), 124571464.0);
    }

    #[tokio::test]
    async fn test_fs_namesystem_identity_mapping() {
        let ex = extractor();
        let fields = [
            ("MissingBlocks", 1.0),
            ("UnderReplicatedBlocks", 2.0),
            ("CapacityTotal", 3.5e12),
            ("CapacityUsed", 4.0),
            ("CapacityRemaining", 5.0),
            ("CapacityUsedNonDFS", 6.0),
            ("BlocksTotal", 7.0),
            ("FilesTotal", 8.0),
            ("CorruptBlocks", 9.0),
            ("ExcessBlocks", 10.0),
            ("StaleDataNodes", 11.0),
        ];
        let mut bean = serde_json::Map::new();
        bean.insert("name".into(), json!(FS_NAMESYSTEM_BEAN));
        for (field, v) in fields {
            bean.insert(field.into(), json!(v));
        }

        ex.apply_document(&body(json!({ "beans": [bean] })))
            .await
            .unwrap();

        for (field, v) in fields {
            assert_eq!(value(&ex, field), v, "{}", field);
        }
    }

    #[tokio::test]
    async fn test_duplicate_bean_last_write_wins() {
        let ex = extractor();
        let doc = json!({ "beans": [
            { "name": FS_NAMESYSTEM_BEAN, "MissingBlocks": 3, "FilesTotal": 10 },
            { "name": FS_NAMESYSTEM_BEAN, "MissingBlocks": 9, "FilesTotal": 10 },
        ]});
        ex.apply_document(&body(doc)).await.unwrap();
        assert_eq!(value(&ex, "MissingBlocks"), 9.0);
        assert_eq!(value(&ex, "FilesTotal"), 10.0);
    }

    #[tokio::test]
    async fn test_decode_error_keeps_previous_values() {
        let ex = extractor();
        ex.apply_document(FIXTURE.as_bytes()).await.unwrap();
        let before = ex.snapshot().await;

        let err = ex.apply_document(b"<html>Service Unavailable</html>").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert_eq!(ex.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_shape_errors_keep_previous_values() {
        let ex = extractor();
        ex.apply_document(FIXTURE.as_bytes()).await.unwrap();
        let before = ex.snapshot().await;

        for doc in [
            json!({ "Beans": [] }),
            json!({ "beans": { "name": FS_NAMESYSTEM_BEAN } }),
            json!([{ "name": FS_NAMESYSTEM_BEAN, "MissingBlocks": 99 }]),
            json!(null),
        ] {
            let err = ex.apply_document(&body(doc)).await.unwrap_err();
            assert!(matches!(err, FetchError::Shape(_)), "{:?}", err);
        }
        assert_eq!(ex.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_unnamed_and_malformed_beans_are_skipped() {
        let ex = extractor();
        let doc = json!({ "beans": [
            { "modelerType": "FSNamesystem", "MissingBlocks": 100 },
            "garbage",
            42,
            { "name": null, "MissingBlocks": 100 },
            { "name": FS_NAMESYSTEM_BEAN, "MissingBlocks": 4 },
            { "name": "java.lang:type=Memory", "HeapMemoryUsage": { "committed": 1, "init": 2, "max": 3, "used": 4 } },
        ]});
        let report = ex.apply_document(&body(doc)).await.unwrap();

        assert_eq!(report.beans_seen, 6);
        assert_eq!(report.beans_skipped, 4);
        assert_eq!(report.beans_matched, 2);
        assert_eq!(value(&ex, "MissingBlocks"), 4.0);
        assert_eq!(value(&ex, "heapMemoryUsageUsed"), 4.0);
    }

    #[tokio::test]
    async fn test_namenode_status_state() {
        let ex = extractor();
        let status = |state: &str| {
            body(json!({ "beans": [{
                "name": "Hadoop:service=NameNode,name=NameNodeStatus",
                "State": state,
                "LastHATransitionTime": 1484149009998u64,
            }]}))
        };

        ex.apply_document(&status("active")).await.unwrap();
        assert_eq!(value(&ex, "state"), 1.0);

        ex.apply_document(&status("standby")).await.unwrap();
        assert_eq!(value(&ex, "state"), 0.0);
        assert_eq!(value(&ex, "lastHATransitionTime"), 1484149009998.0);
        // Sourced from FSNamesystem, untouched here.
        assert_eq!(value(&ex, "isActive"), 0.0);
    }

    #[tokio::test]
    async fn test_heap_memory_usage() {
        let ex = extractor();
        let doc = json!({ "beans": [{
            "name": "java.lang:type=Memory",
            "HeapMemoryUsage": { "committed": 100, "init": 50, "max": 200, "used": 30 },
            "NonHeapMemoryUsage": { "committed": 1, "init": 1, "max": -1, "used": 1 },
        }]});
        ex.apply_document(&body(doc)).await.unwrap();

        assert_eq!(value(&ex, "heapMemoryUsageCommitted"), 100.0);
        assert_eq!(value(&ex, "heapMemoryUsageInit"), 50.0);
        assert_eq!(value(&ex, "heapMemoryUsageMax"), 200.0);
        assert_eq!(value(&ex, "heapMemoryUsageUsed"), 30.0);
    }

    #[tokio::test]
    async fn test_bad_field_does_not_suppress_siblings() {
        let ex = extractor();
        ex.apply_document(&body(json!({ "beans": [
            { "name": FS_NAMESYSTEM_BEAN, "CorruptBlocks": 5, "ExcessBlocks": 6 },
        ]})))
        .await
        .unwrap();

        let report = ex
            .apply_document(&body(json!({ "beans": [
                { "name": FS_NAMESYSTEM_BEAN, "CorruptBlocks": "n/a", "ExcessBlocks": 7, "tag.HAState": 1 },
                { "name": "java.lang:type=Memory", "HeapMemoryUsage": { "committed": 1, "init": 2, "max": 3, "used": "lots" } },
            ]})))
            .await
            .unwrap();

        // CorruptBlocks (wrong kind) and tag.HAState (wrong kind) keep their values.
        assert_eq!(value(&ex, "CorruptBlocks"), 5.0);
        assert_eq!(value(&ex, "isActive"), 0.0);
        assert_eq!(value(&ex, "ExcessBlocks"), 7.0);
        assert_eq!(value(&ex, "heapMemoryUsageMax"), 3.0);
        assert_eq!(value(&ex, "heapMemoryUsageUsed"), 0.0);
        assert_eq!(report.fields_updated, 4);
        // 9 missing FSNamesystem fields + CorruptBlocks + tag.HAState + used.
        assert_eq!(report.fields_skipped, 12);
    }

    #[tokio::test]
    async fn test_out_of_range_number_skips_only_that_field() {
        let ex = extractor();
        let report = ex
            .apply_document(
                br#"{"beans":[{"name":"Hadoop:service=NameNode,name=FSNamesystem","CapacityTotal":1e400,"FilesTotal":184}]}"#,
            )
            .await
            .unwrap();

        assert_eq!(report.fields_updated, 1);
        // CapacityTotal plus the ten FSNamesystem fields absent from the bean.
        assert_eq!(report.fields_skipped, 11);
        assert_eq!(value(&ex, "FilesTotal"), 184.0);
        assert_eq!(value(&ex, "CapacityTotal"), 0.0);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_field_skip_emits_warning() {
        let ex = extractor();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let doc = body(json!({ "beans": [{
            "name": "java.lang:type=Memory",
            "HeapMemoryUsage": { "committed": 1, "init": 2, "max": 3, "used": "lots" },
        }]}));
        let report = tracing::subscriber::with_default(subscriber, || ex.apply_locked(&doc)).unwrap();

        assert_eq!(report.fields_skipped, 1);
        let text = logs.text();
        assert_eq!(text.matches("skipping bean field").count(), 1, "{}", text);
        assert!(text.contains("WARN"), "{}", text);
        assert!(text.contains("java.lang:type=Memory"), "{}", text);
        assert!(text.contains("field=HeapMemoryUsage.used"), "{}", text);
        assert!(text.contains("heapMemoryUsageUsed"), "{}", text);
        assert!(text.contains("expected number, found string"), "{}", text);
    }

    #[tokio::test]
    async fn test_absent_bean_keeps_stale_value() {
        let ex = extractor();
        ex.apply_document(FIXTURE.as_bytes()).await.unwrap();

        ex.apply_document(&body(json!({ "beans": [
            { "name": "java.lang:type=GarbageCollector,name=ParNew", "CollectionCount": 20, "CollectionTime": 400 },
        ]})))
        .await
        .unwrap();

        assert_eq!(value(&ex, "ParNew_CollectionCount"), 20.0);
        assert_eq!(value(&ex, "BlocksTotal"), 67.0);
        assert_eq!(value(&ex, "heapMemoryUsageUsed"), 124571464.0);
    }

    #[tokio::test]
    async fn test_unknown_beans_are_ignored() {
        let ex = extractor();
        let report = ex
            .apply_document(&body(json!({ "beans": [
                { "name": "java.lang:type=MemoryPool,name=Code Cache", "Usage": { "used": 1 } },
                { "name": "java.lang:type=GarbageCollector,name=G1 Young Generation", "CollectionCount": 5 },
            ]})))
            .await
            .unwrap();

        assert_eq!(report.beans_matched, 0);
        assert_eq!(report.fields_skipped, 0);
        assert!(ex.snapshot().await.iter().all(|s| s.value == 0.0));
    }

    #[tokio::test]
    async fn test_empty_bean_list_is_success() {
        let ex = extractor();
        let report = ex.apply_document(br#"{"beans": []}"#).await.unwrap();
        assert_eq!(report, CycleReport::default());
    }

    #[tokio::test]
    async fn test_repeated_cycles_are_idempotent() {
        let ex = extractor();
        ex.apply_document(FIXTURE.as_bytes()).await.unwrap();
        let first = ex.snapshot().await;
        let first_text = ex.render().await.unwrap();

        ex.apply_document(FIXTURE.as_bytes()).await.unwrap();
        assert_eq!(ex.snapshot().await, first);
        assert_eq!(ex.render().await.unwrap(), first_text);
    }

    #[tokio::test]
    async fn test_duplicate_metric_in_table_fails() {
        static TABLE: &[FieldMapping] = &[
            FieldMapping::number(FS_NAMESYSTEM_BEAN, "MissingBlocks", "MissingBlocks", "MissingBlocks"),
            FieldMapping::number(FS_NAMESYSTEM_BEAN, "CorruptBlocks", "MissingBlocks", "MissingBlocks"),
        ];
        let registry = Arc::new(MetricsRegistry::with_namespace(NAMESPACE));
        let client = JmxClient::new(DEFAULT_TIMEOUT).unwrap();
        let result = BeanExtractor::with_table(registry, client, TABLE);
        assert!(matches!(result, Err(MonitorError::DuplicateMetric(_))));
    }

    #[tokio::test]
    async fn test_second_extractor_on_same_registry_fails() {
        let registry = Arc::new(MetricsRegistry::with_namespace(NAMESPACE));
        let client = JmxClient::new(DEFAULT_TIMEOUT).unwrap();
        BeanExtractor::new(registry.clone(), client.clone()).unwrap();
        assert!(BeanExtractor::new(registry, client).is_err());
    }
}
