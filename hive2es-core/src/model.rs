//! Data model shared by every hive2es crate.

use crate::validate::PARTITION_DESCRIPTOR;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

// ============================================================================
// COLUMNS
// ============================================================================

/// One column of the source table or view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Hive type as printed by `DESCRIBE`, e.g. `string`, `array<int>`.
    pub data_type: String,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered set of columns. Names are unique, order is first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    columns: Vec<ColumnDefinition>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column unless one with the same name is already present.
    /// Returns whether the column was added.
    pub fn push(&mut self, column: ColumnDefinition) -> bool {
        if self.contains(&column.name) {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDefinition> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnDefinition> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = ColumnDefinition>>(iter: I) -> Self {
        let mut set = ColumnSet::new();
        let mut seen = HashSet::new();
        for column in iter {
            if seen.insert(column.name.to_ascii_lowercase()) {
                set.columns.push(column);
            }
        }
        set
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ColumnDefinition;
    type IntoIter = std::slice::Iter<'a, ColumnDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

// ============================================================================
// PARTITIONS
// ============================================================================

/// A single-level Hive partition, identified by its `key=value` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKeyValue {
    pub key: String,
    pub value: String,
}

impl PartitionKeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a strict `key=value` descriptor.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let caps = PARTITION_DESCRIPTOR.captures(descriptor)?;
        Some(Self::new(&caps[1], &caps[2]))
    }

    /// The formatted identity, `key=value`.
    pub fn descriptor(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    /// Hive `WHERE` predicate selecting this partition.
    pub fn predicate(&self) -> String {
        format!("`{}` = '{}'", self.key, self.value)
    }
}

impl fmt::Display for PartitionKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

// ============================================================================
// INDEX TARGET
// ============================================================================

/// The physical Elasticsearch index a partition is loaded into.
///
/// Replicas are always 0 and refresh is disabled while the bulk load runs;
/// both are fixed by the lifecycle rather than configurable per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTarget {
    pub base_name: String,
    pub suffix: Option<String>,
    pub alias: Option<String>,
    pub shards: u32,
}

impl IndexTarget {
    pub const REPLICAS: u32 = 0;
    /// `refresh_interval` applied at creation time.
    pub const LOAD_REFRESH_INTERVAL: &'static str = "-1";
    /// `refresh_interval` restored once the load has finished.
    pub const SERVING_REFRESH_INTERVAL: &'static str = "1s";

    pub fn new(base_name: impl Into<String>, shards: u32) -> Self {
        Self {
            base_name: base_name.into(),
            suffix: None,
            alias: None,
            shards,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into().to_ascii_lowercase());
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    /// Physical index name.
    pub fn name(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}_{}", self.base_name, suffix),
            None => self.base_name.clone(),
        }
    }

    /// Stable name consumers query against.
    pub fn logical_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.base_name)
    }
}

// ============================================================================
// JOB RUNS
// ============================================================================

/// How an external process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl JobExit {
    pub const SIGINT: i32 = 2;
    /// Shells report a child killed by SIGINT as 128 + 2.
    pub const SIGINT_EXIT_CODE: i32 = 130;

    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn interrupted(&self) -> bool {
        self.signal == Some(Self::SIGINT) || self.code == Some(Self::SIGINT_EXIT_CODE)
    }
}

impl From<std::process::ExitStatus> for JobExit {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self {
                code: status.code(),
                signal: status.signal(),
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                code: status.code(),
                signal: None,
            }
        }
    }
}

impl fmt::Display for JobExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// One batch job invocation. Lives for a single orchestration iteration and
/// is kept only in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub table: String,
    pub view: Option<String>,
    pub partition: Option<PartitionKeyValue>,
    pub target_index: String,
    pub exit: JobExit,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_set_dedupes_in_order() {
        let set: ColumnSet = vec![
            ColumnDefinition::new("id", "int"),
            ColumnDefinition::new("name", "string"),
            ColumnDefinition::new("id", "bigint"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.names(), vec!["id", "name"]);
        assert_eq!(set.get("id").map(|c| c.data_type.as_str()), Some("int"));
    }

    #[test]
    fn test_column_set_push_rejects_duplicate() {
        let mut set = ColumnSet::new();
        assert!(set.push(ColumnDefinition::new("id", "int")));
        assert!(!set.push(ColumnDefinition::new("ID", "int")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_partition_parse_and_predicate() {
        let p = PartitionKeyValue::parse("dt=2020-01-01").unwrap();
        assert_eq!(p.key, "dt");
        assert_eq!(p.value, "2020-01-01");
        assert_eq!(p.descriptor(), "dt=2020-01-01");
        assert_eq!(p.predicate(), "`dt` = '2020-01-01'");
        assert!(PartitionKeyValue::parse("dt=2020/01").is_none());
    }

    #[test]
    fn test_index_target_names() {
        let plain = IndexTarget::new("sales", 5);
        assert_eq!(plain.name(), "sales");
        assert_eq!(plain.logical_name(), "sales");

        let suffixed = IndexTarget::new("sales", 5)
            .with_suffix("2020-01-01")
            .with_alias(Some("sales-alias".to_string()));
        assert_eq!(suffixed.name(), "sales_2020-01-01");
        assert_eq!(suffixed.logical_name(), "sales-alias");
    }

    #[test]
    fn test_index_suffix_lowercased() {
        let target = IndexTarget::new("events", 1).with_suffix("EU");
        assert_eq!(target.name(), "events_eu");
    }

    #[test]
    fn test_job_exit_classification() {
        assert!(JobExit::code(0).success());
        assert!(!JobExit::code(1).success());
        assert!(!JobExit::code(1).interrupted());
        assert!(JobExit::code(130).interrupted());
        assert!(JobExit::signal(2).interrupted());
        assert!(!JobExit::signal(9).interrupted());
        assert_eq!(JobExit::signal(9).to_string(), "signal 9");
        assert_eq!(JobExit::code(4).to_string(), "exit code 4");
    }
}
