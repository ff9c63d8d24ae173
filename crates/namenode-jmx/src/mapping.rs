//! The field mapping table.
//!
//! Each row says: on the bean called `bean`, read `path`, turn it into an f64
//! with `coercion`, and store it in the gauge called `metric`. Beans that no
//! row names are ignored.

use std::fmt;

/// Namespace prepended to every metric name (`namenode_<metric>`).
pub const NAMESPACE: &str = "namenode";

pub const FS_NAMESYSTEM_BEAN: &str = "Hadoop:service=NameNode,name=FSNamesystem";
pub const NAMENODE_STATUS_BEAN: &str = "Hadoop:service=NameNode,name=NameNodeStatus";
pub const PAR_NEW_GC_BEAN: &str = "java.lang:type=GarbageCollector,name=ParNew";
pub const CMS_GC_BEAN: &str = "java.lang:type=GarbageCollector,name=ConcurrentMarkSweep";
pub const MEMORY_BEAN: &str = "java.lang:type=Memory";

/// Sentinel compared against string state fields.
pub const ACTIVE_STATE: &str = "active";

/// Location of a value inside a bean.
///
/// Keys are taken verbatim: `tag.HAState` is a single top-level key, not a
/// nested lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    /// A top-level key of the bean.
    Field(&'static str),
    /// A key inside a sub-mapping of the bean, e.g. `HeapMemoryUsage` / `used`.
    Nested(&'static str, &'static str),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Field(key) => f.write_str(key),
            FieldPath::Nested(outer, inner) => write!(f, "{}.{}", outer, inner),
        }
    }
}

/// How a resolved JSON value becomes a gauge reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// JSON number, taken as-is. Non-finite values are rejected.
    Number,
    /// JSON string, 1.0 if it equals `"active"`, 0.0 otherwise.
    ActiveFlag,
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub bean: &'static str,
    pub path: FieldPath,
    pub metric: &'static str,
    pub help: &'static str,
    pub coercion: Coercion,
}

impl FieldMapping {
    pub const fn number(bean: &'static str, field: &'static str, metric: &'static str, help: &'static str) -> Self {
        Self {
            bean,
            path: FieldPath::Field(field),
            metric,
            help,
            coercion: Coercion::Number,
        }
    }

    pub const fn nested_number(
        bean: &'static str,
        outer: &'static str,
        inner: &'static str,
        metric: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            bean,
            path: FieldPath::Nested(outer, inner),
            metric,
            help,
            coercion: Coercion::Number,
        }
    }

    pub const fn active_flag(bean: &'static str, field: &'static str, metric: &'static str, help: &'static str) -> Self {
        Self {
            bean,
            path: FieldPath::Field(field),
            metric,
            help,
            coercion: Coercion::ActiveFlag,
        }
    }
}

/// Everything the exporter reads from the NameNode. Declaration and
/// rendering order follow this table.
pub static NAMENODE_FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "MissingBlocks", "MissingBlocks", "MissingBlocks"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "UnderReplicatedBlocks", "UnderReplicatedBlocks", "UnderReplicatedBlocks"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "CapacityTotal", "CapacityTotal", "CapacityTotal"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "CapacityUsed", "CapacityUsed", "CapacityUsed"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "CapacityRemaining", "CapacityRemaining", "CapacityRemaining"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "CapacityUsedNonDFS", "CapacityUsedNonDFS", "CapacityUsedNonDFS"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "BlocksTotal", "BlocksTotal", "BlocksTotal"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "FilesTotal", "FilesTotal", "FilesTotal"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "CorruptBlocks", "CorruptBlocks", "CorruptBlocks"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "ExcessBlocks", "ExcessBlocks", "ExcessBlocks"),
    FieldMapping::number(FS_NAMESYSTEM_BEAN, "StaleDataNodes", "StaleDataNodes", "StaleDataNodes"),
    FieldMapping::number(PAR_NEW_GC_BEAN, "CollectionCount", "ParNew_CollectionCount", "ParNew GC Count"),
    FieldMapping::number(PAR_NEW_GC_BEAN, "CollectionTime", "ParNew_CollectionTime", "ParNew GC Time"),
    FieldMapping::number(CMS_GC_BEAN, "CollectionCount", "ConcurrentMarkSweep_CollectionCount", "ConcurrentMarkSweep GC Count"),
    FieldMapping::number(CMS_GC_BEAN, "CollectionTime", "ConcurrentMarkSweep_CollectionTime", "ConcurrentMarkSweep GC Time"),
    FieldMapping::nested_number(MEMORY_BEAN, "HeapMemoryUsage", "committed", "heapMemoryUsageCommitted", "heapMemoryUsageCommitted"),
    FieldMapping::nested_number(MEMORY_BEAN, "HeapMemoryUsage", "init", "heapMemoryUsageInit", "heapMemoryUsageInit"),
    FieldMapping::nested_number(MEMORY_BEAN, "HeapMemoryUsage", "max", "heapMemoryUsageMax", "heapMemoryUsageMax"),
    FieldMapping::nested_number(MEMORY_BEAN, "HeapMemoryUsage", "used", "heapMemoryUsageUsed", "heapMemoryUsageUsed"),
    FieldMapping::number(NAMENODE_STATUS_BEAN, "LastHATransitionTime", "lastHATransitionTime", "last HA Transition Time"),
    FieldMapping::active_flag(NAMENODE_STATUS_BEAN, "State", "state", "Current namenode state, 1 if active 0 if standby"),
    // Redundant with `state`, but sourced from a different bean and kept as its own series.
    FieldMapping::active_flag(FS_NAMESYSTEM_BEAN, "tag.HAState", "isActive", "isActive"),
];

/// Rows of `table` that apply to the bean called `bean_name`, with their row index.
pub fn mappings_for<'a>(
    table: &'a [FieldMapping],
    bean_name: &'a str,
) -> impl Iterator<Item = (usize, &'a FieldMapping)> + 'a {
    table
        .iter()
        .enumerate()
        .filter(move |(_, m)| m.bean == bean_name)
}
