//! Table metadata discovery.
//!
//! `MetadataProvider` is the seam between the loader and wherever schema and
//! partition information comes from. The shipped implementation scrapes the
//! Hive CLI; a metastore client could replace it without touching callers.

use crate::cli::HiveCli;
use async_trait::async_trait;
use hive2es_core::{ColumnDefinition, CommandError, DiscoveryError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Source of schema and partition information.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Columns of `database.object` (table or view) in declaration order.
    /// An unknown object yields an empty list.
    async fn describe_columns(
        &self,
        database: &str,
        object: &str,
    ) -> Result<Vec<ColumnDefinition>, DiscoveryError>;

    /// Raw partition descriptors of `database.table`. Unpartitioned tables
    /// yield an empty list.
    async fn list_partitions(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DiscoveryError>;
}

// ============================================================================
// OUTPUT PARSING
// ============================================================================

static COLUMN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*([A-Za-z_][A-Za-z0-9_]*)\s+((?:tinyint|smallint|int|integer|bigint|boolean|float|double|decimal|numeric|string|varchar|char|date|timestamp|binary|array|map|struct|uniontype|interval)\b\S*)",
    )
    .expect("describe column regex")
});

const SECTION_MARKERS: [&str; 2] = ["# partition information", "# detailed table information"];

/// Parse `DESCRIBE` output into columns.
///
/// Reading stops at the partition or detailed-table section; partition
/// columns already appear in the main listing. Duplicates keep their first
/// occurrence.
pub fn parse_describe_output(output: &str) -> Vec<ColumnDefinition> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for line in output.lines() {
        let lowered = line.trim().to_ascii_lowercase();
        if SECTION_MARKERS.iter().any(|m| lowered.starts_with(m)) {
            break;
        }
        if lowered.is_empty() || lowered.starts_with('#') {
            continue;
        }
        let Some(caps) = COLUMN_LINE.captures(line) else {
            continue;
        };
        let name = caps[1].to_string();
        if seen.insert(name.to_ascii_lowercase()) {
            columns.push(ColumnDefinition::new(name, caps[2].to_ascii_lowercase()));
        }
    }
    columns
}

/// Parse `SHOW PARTITIONS` output: every non-empty line is a descriptor.
pub fn parse_show_partitions(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// HIVE CLI PROVIDER
// ============================================================================

/// `MetadataProvider` backed by `hive -e 'DESCRIBE ...'` and
/// `hive -e 'SHOW PARTITIONS ...'`.
#[derive(Debug, Clone, Default)]
pub struct HiveMetadataProvider {
    cli: HiveCli,
}

impl HiveMetadataProvider {
    pub fn new(cli: HiveCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl MetadataProvider for HiveMetadataProvider {
    async fn describe_columns(
        &self,
        database: &str,
        object: &str,
    ) -> Result<Vec<ColumnDefinition>, DiscoveryError> {
        let query = format!("DESCRIBE `{}`.`{}`", database, object);
        match self.cli.capture(&query).await {
            Ok(output) => Ok(parse_describe_output(&output)),
            // Hive exits non-zero for unknown tables; the resolver turns the
            // empty result into SchemaNotFound.
            Err(CommandError::NonZeroExit { stderr, status, .. }) => {
                tracing::warn!(database, object, %status, stderr = %stderr, "DESCRIBE failed");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_partitions(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let query = format!("SHOW PARTITIONS `{}`.`{}`", database, table);
        match self.cli.capture(&query).await {
            Ok(output) => Ok(parse_show_partitions(&output)),
            Err(CommandError::NonZeroExit { stderr, .. })
                if stderr.to_ascii_lowercase().contains("is not a partitioned table") =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
