//! hive2es Test Utilities
//!
//! Shared test infrastructure for the hive2es workspace:
//! - In-memory mocks for every capability seam (metadata, batch jobs,
//!   index administration, credential renewal)
//! - Fixtures for common run configurations
//! - Proptest generators for identifiers, columns and partitions

pub use hive2es_core::{
    ColumnDefinition, ColumnSet, JobExit, LoadFlags, PartitionKeyValue, RunConfig, RunOptions,
};

use async_trait::async_trait;
use hive2es_core::{CommandError, DiscoveryError, ElasticError};
use hive2es_elastic::{AdminOutcome, IndexAdmin};
use hive2es_hive::{BatchRunner, HiveJob, MetadataProvider};
use hive2es_loader::CredentialRenewer;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// METADATA
// ============================================================================

/// In-memory `MetadataProvider` keyed by `database.object`.
#[derive(Debug, Default)]
pub struct MockMetadataProvider {
    columns: HashMap<String, Vec<ColumnDefinition>>,
    partitions: HashMap<String, Vec<String>>,
    describe_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table or view. `columns` are `(name, type)` pairs.
    pub fn with_object(mut self, database: &str, object: &str, columns: &[(&str, &str)]) -> Self {
        self.columns.insert(
            key(database, object),
            columns
                .iter()
                .map(|(name, ty)| ColumnDefinition::new(*name, *ty))
                .collect(),
        );
        self
    }

    /// Raw `SHOW PARTITIONS` lines for a table.
    pub fn with_partitions(mut self, database: &str, table: &str, descriptors: &[&str]) -> Self {
        self.partitions.insert(
            key(database, table),
            descriptors.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn key(database: &str, object: &str) -> String {
    format!("{}.{}", database, object).to_ascii_lowercase()
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn describe_columns(
        &self,
        database: &str,
        object: &str,
    ) -> Result<Vec<ColumnDefinition>, DiscoveryError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .columns
            .get(&key(database, object))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_partitions(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .partitions
            .get(&key(database, table))
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// INDEX ADMINISTRATION
// ============================================================================

/// One call made against an `IndexAdmin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    Exists(String),
    Create(String, u32),
    Delete(String),
    Refresh(String),
    Alias(String, String),
    Optimize(String),
}

#[derive(Debug, Default)]
struct ClusterState {
    indices: HashSet<String>,
    aliases: HashSet<(String, String)>,
    calls: Vec<AdminCall>,
}

/// In-memory `IndexAdmin` that behaves like an idempotent cluster and records
/// every call.
#[derive(Debug, Default)]
pub struct RecordingIndexAdmin {
    state: Mutex<ClusterState>,
    /// Operation names (`create`, `refresh`, ...) that answer `Error`.
    failing: HashSet<&'static str>,
    unreachable: bool,
}

impl RecordingIndexAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, indices: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.indices.extend(indices.iter().map(|i| i.to_string()));
        }
        self
    }

    /// Make one operation fail with an `Error` outcome.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Every call fails as if no node answered.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than `exists`.
    pub fn mutations(&self) -> Vec<AdminCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, AdminCall::Exists(_)))
            .collect()
    }

    pub fn indices(&self) -> HashSet<String> {
        self.state.lock().unwrap().indices.clone()
    }

    pub fn aliases(&self) -> HashSet<(String, String)> {
        self.state.lock().unwrap().aliases.clone()
    }

    fn injected(&self, operation: &'static str) -> Option<AdminOutcome> {
        if self.unreachable {
            return Some(AdminOutcome::from(ElasticError::NoNodes));
        }
        self.failing
            .contains(operation)
            .then(|| AdminOutcome::Error(format!("injected {} failure", operation)))
    }
}

#[async_trait]
impl IndexAdmin for RecordingIndexAdmin {
    async fn exists(&self, index: &str) -> Result<bool, ElasticError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AdminCall::Exists(index.to_string()));
        if self.unreachable || self.failing.contains("exists") {
            return Err(ElasticError::NoNodes);
        }
        Ok(state.indices.contains(index))
    }

    async fn create(&self, index: &str, shards: u32) -> AdminOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AdminCall::Create(index.to_string(), shards));
        if let Some(outcome) = self.injected("create") {
            return outcome;
        }
        if state.indices.insert(index.to_string()) {
            AdminOutcome::Success
        } else {
            AdminOutcome::AlreadyInState
        }
    }

    async fn delete(&self, index: &str) -> AdminOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AdminCall::Delete(index.to_string()));
        if let Some(outcome) = self.injected("delete") {
            return outcome;
        }
        if state.indices.remove(index) {
            state.aliases.retain(|(i, _)| i != index);
            AdminOutcome::Success
        } else {
            AdminOutcome::AlreadyInState
        }
    }

    async fn refresh(&self, index: &str) -> AdminOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AdminCall::Refresh(index.to_string()));
        self.injected("refresh").unwrap_or(AdminOutcome::Success)
    }

    async fn alias(&self, index: &str, alias: &str) -> AdminOutcome {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(AdminCall::Alias(index.to_string(), alias.to_string()));
        if let Some(outcome) = self.injected("alias") {
            return outcome;
        }
        if state.aliases.insert((index.to_string(), alias.to_string())) {
            AdminOutcome::Success
        } else {
            AdminOutcome::AlreadyInState
        }
    }

    async fn optimize(&self, index: &str) -> AdminOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AdminCall::Optimize(index.to_string()));
        self.injected("optimize").unwrap_or(AdminOutcome::Success)
    }
}

// ============================================================================
// BATCH JOBS
// ============================================================================

/// `BatchRunner` that hands out scripted exit statuses in call order and
/// records every job it was given. Once the script runs out every job
/// succeeds.
#[derive(Debug, Default)]
pub struct ScriptedBatchRunner {
    exits: Mutex<VecDeque<JobExit>>,
    jobs: Mutex<Vec<HiveJob>>,
    spawn_failure: Option<CommandError>,
}

impl ScriptedBatchRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_exits(exits: impl IntoIterator<Item = JobExit>) -> Self {
        Self {
            exits: Mutex::new(exits.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Every job fails to start.
    pub fn unspawnable(program: &str) -> Self {
        Self {
            spawn_failure: Some(CommandError::Spawn {
                program: program.to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<HiveJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BatchRunner for ScriptedBatchRunner {
    async fn run(&self, job: &HiveJob) -> Result<JobExit, CommandError> {
        if let Some(err) = &self.spawn_failure {
            return Err(err.clone());
        }
        self.jobs.lock().unwrap().push(job.clone());
        let exit = self
            .exits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(JobExit::code(0));
        Ok(exit)
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Counts renewals; optionally fails every one of them.
#[derive(Debug, Default)]
pub struct CountingRenewer {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingRenewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRenewer for CountingRenewer {
    async fn renew(&self) -> Result<(), CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CommandError::NonZeroExit {
                program: "kinit".to_string(),
                status: "exit code 1".to_string(),
                stderr: "kinit: No credentials cache found while renewing credentials"
                    .to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built configurations and metadata for common scenarios.

    use super::*;

    pub const SALES_COLUMNS: [(&str, &str); 4] = [
        ("id", "bigint"),
        ("customer", "string"),
        ("amount", "decimal(10,2)"),
        ("dt", "string"),
    ];

    /// Options for loading `default.<table>` with everything else defaulted.
    pub fn options(table: &str) -> RunOptions {
        RunOptions {
            table: Some(table.to_string()),
            ..RunOptions::default()
        }
    }

    pub fn config(options: RunOptions) -> RunConfig {
        RunConfig::from_options(options).expect("fixture options must be valid")
    }

    pub fn sales_config() -> RunConfig {
        config(options("sales"))
    }

    pub fn sales_config_with(flags: LoadFlags, alias: Option<&str>) -> RunConfig {
        config(RunOptions {
            flags,
            alias: alias.map(str::to_string),
            ..options("sales")
        })
    }

    /// `default.sales` with the given partitions.
    pub fn sales_metadata(partitions: &[&str]) -> MockMetadataProvider {
        MockMetadataProvider::new()
            .with_object("default", "sales", &SALES_COLUMNS)
            .with_partitions("default", "sales", partitions)
    }

    pub fn three_days() -> [&'static str; 3] {
        ["dt=2020-01-01", "dt=2020-01-02", "dt=2020-01-03"]
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for hive2es inputs.

    use super::*;
    use proptest::prelude::*;

    /// A Hive identifier: letters, digits and underscores, starting with a
    /// letter.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    /// A column type `DESCRIBE` can report.
    pub fn arb_column_type() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("int".to_string()),
            Just("bigint".to_string()),
            Just("string".to_string()),
            Just("double".to_string()),
            Just("boolean".to_string()),
            Just("timestamp".to_string()),
            Just("decimal(10,2)".to_string()),
            Just("array<string>".to_string()),
        ]
    }

    /// Columns that may contain duplicate names.
    pub fn arb_columns() -> impl Strategy<Value = Vec<ColumnDefinition>> {
        prop::collection::vec((arb_identifier(), arb_column_type()), 1..20).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, ty)| ColumnDefinition::new(name, ty))
                .collect()
        })
    }

    pub fn arb_partition_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9_.:+-]{0,11}"
    }

    /// `key=value` descriptors sharing one key whose values stay distinct
    /// once lowercased, as a loadable table's must.
    pub fn arb_partition_descriptors() -> impl Strategy<Value = (String, Vec<String>)> {
        (
            arb_identifier(),
            prop::collection::btree_set(arb_partition_value(), 1..8),
        )
            .prop_map(|(key, values)| {
                let mut seen = HashSet::new();
                let descriptors = values
                    .into_iter()
                    .filter(|v| seen.insert(v.to_ascii_lowercase()))
                    .map(|v| format!("{}={}", key, v))
                    .collect();
                (key, descriptors)
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
