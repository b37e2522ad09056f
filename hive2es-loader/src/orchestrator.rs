//! The per-partition load loop.
//!
//! Partitions are processed one at a time in plan order. For each one the
//! target index is prepared, the Hive job runs to completion, and the index
//! is finalized or cleaned up depending on how the job ended. Index
//! administration is best-effort throughout; only the job's exit status
//! decides whether a partition failed.

use crate::cooldown::{Cooldown, CooldownOutcome};
use crate::credentials::CredentialRenewer;
use crate::report::{AbortReason, PartitionReport, PartitionState, RunReport};
use crate::shutdown::ShutdownSignal;
use chrono::Utc;
use hive2es_core::{
    ColumnSet, DiscoveryError, Hive2EsError, Hive2EsResult, IndexTarget, JobExit, JobRun, LoadError, PartitionKeyValue,
    RunConfig,
};
use hive2es_elastic::{IndexAdmin, IndexLifecycle};
use hive2es_hive::{
    BatchRunner, MetadataProvider, PartitionEnumerator, PartitionPlan, QueryBuilder,
    SchemaResolver,
};
use std::path::Path;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Drives a whole run: discovery once, then every planned partition.
pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    metadata: &'a dyn MetadataProvider,
    runner: &'a dyn BatchRunner,
    admin: &'a dyn IndexAdmin,
    renewer: Option<&'a dyn CredentialRenewer>,
    jar: Option<&'a Path>,
    shutdown: ShutdownSignal,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunConfig,
        metadata: &'a dyn MetadataProvider,
        runner: &'a dyn BatchRunner,
        admin: &'a dyn IndexAdmin,
    ) -> Self {
        Self {
            config,
            metadata,
            runner,
            admin,
            renewer: None,
            jar: None,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn with_renewer(mut self, renewer: Option<&'a dyn CredentialRenewer>) -> Self {
        self.renewer = renewer;
        self
    }

    pub fn with_jar(mut self, jar: Option<&'a Path>) -> Self {
        self.jar = jar;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run discovery and load every planned partition.
    ///
    /// Discovery failures and a batch job that cannot be started are `Err`.
    /// Everything else, including failed partitions and aborts, is described
    /// by the returned report; see [`RunReport::into_result`].
    pub async fn run(&self) -> Hive2EsResult<RunReport> {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!(
            "load_run",
            %run_id,
            table = %self.config.qualified_table()
        );
        self.run_partitions(run_id).instrument(span).await
    }

    async fn run_partitions(&self, run_id: Uuid) -> Hive2EsResult<RunReport> {
        let config = self.config;
        let run_started = Instant::now();

        let started = Instant::now();
        let columns = SchemaResolver::new(self.metadata)
            .resolve(config)
            .await
            .map_err(|err| self.discovery_error(err))?;
        tracing::info!(
            source = %config.qualified_source(),
            columns = columns.len(),
            elapsed_secs = started.elapsed().as_secs(),
            "Resolved {} columns: {}",
            columns.len(),
            columns.names().join(", ")
        );

        let started = Instant::now();
        let plan = PartitionEnumerator::new(self.metadata)
            .enumerate(config)
            .await
            .map_err(|err| self.discovery_error(err))?;
        tracing::info!(
            table = %config.qualified_table(),
            discovered = plan.discovered,
            selected = plan.partitions.len(),
            elapsed_secs = started.elapsed().as_secs(),
            "Planned {} load(s)",
            plan.iterations()
        );

        let targets: Vec<Option<&PartitionKeyValue>> = if plan.is_partitioned() {
            plan.partitions.iter().map(Some).collect()
        } else {
            vec![None]
        };

        let mut report = RunReport {
            run_id,
            planned: targets.len(),
            ..RunReport::default()
        };
        let cooldown = Cooldown::new(config.cooldown);

        for (position, partition) in targets.iter().copied().enumerate() {
            if self.shutdown.is_triggered() {
                report.aborted = Some(AbortReason::Interrupted);
                break;
            }
            self.renew_credentials().await;

            let target = self.index_target(&plan, partition);
            let result = self.load_partition(&columns, partition, &target, &mut report).await?;
            let failed_exit = result.exit.filter(|_| result.state == PartitionState::Failed);
            report.partitions.push(result);

            let Some(exit) = failed_exit else {
                continue;
            };

            if exit.interrupted() || self.shutdown.is_triggered() {
                tracing::warn!("Load interrupted, skipping remaining partitions");
                report.aborted = Some(AbortReason::Interrupted);
                break;
            }
            if config.flags.stop_on_failure {
                let label = partition
                    .map(PartitionKeyValue::descriptor)
                    .unwrap_or_else(|| config.qualified_source());
                tracing::error!(
                    partition = %label,
                    index = %target.name(),
                    "Stopping after failed load"
                );
                report.aborted = Some(AbortReason::StopOnFailure {
                    partition: label,
                    index: target.name(),
                    exit,
                });
                break;
            }
            let remaining = targets.len() - position - 1;
            if targets.len() > 1
                && remaining > 0
                && cooldown.wait(&self.shutdown).await == CooldownOutcome::Interrupted
            {
                tracing::warn!("Interrupted during cooldown, skipping remaining partitions");
                report.aborted = Some(AbortReason::Interrupted);
                break;
            }
        }

        tracing::info!(
            planned = report.planned,
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            elapsed_secs = run_started.elapsed().as_secs(),
            "Run finished in {}s",
            run_started.elapsed().as_secs()
        );
        Ok(report)
    }

    /// Physical index for a partition. Tables with more than one partition
    /// get one index per partition value.
    fn index_target(
        &self,
        plan: &PartitionPlan,
        partition: Option<&PartitionKeyValue>,
    ) -> IndexTarget {
        let target = IndexTarget::new(self.config.index.clone(), self.config.shards)
            .with_alias(self.config.alias.clone());
        match partition {
            Some(partition) if plan.suffix_indices() => target.with_suffix(partition.value.clone()),
            _ => target,
        }
    }

    /// A Hive query killed by Ctrl-C exits non-zero, which discovery cannot
    /// tell apart from a missing table.
    fn discovery_error(&self, err: DiscoveryError) -> Hive2EsError {
        if self.shutdown.is_triggered() {
            tracing::warn!(error = %err, "Discovery interrupted");
            return LoadError::Interrupted.into();
        }
        err.into()
    }

    async fn renew_credentials(&self) {
        let Some(renewer) = self.renewer else {
            return;
        };
        if let Err(err) = renewer.renew().await {
            tracing::warn!(error = %err, "Credential renewal failed, continuing");
        }
    }

    async fn load_partition(
        &self,
        columns: &ColumnSet,
        partition: Option<&PartitionKeyValue>,
        target: &IndexTarget,
        report: &mut RunReport,
    ) -> Result<PartitionReport, LoadError> {
        let config = self.config;
        let lifecycle = IndexLifecycle::new(self.admin);
        let index = target.name();
        let mut progress = Progress::new(partition, &index);
        progress.advance(PartitionState::ColumnsResolved);

        let exists = lifecycle.exists(&index).await;
        if config.flags.skip_existing && exists {
            tracing::info!(index = %index, "Index exists, skipping load");
            return Ok(progress.finish(PartitionState::Skipped, None));
        }
        if exists && config.flags.recreate_index {
            lifecycle.delete(&index).await;
            lifecycle.create(&index, target.shards).await;
        } else if !exists {
            lifecycle.create(&index, target.shards).await;
        } else {
            tracing::info!(index = %index, "Index exists, appending");
        }
        progress.advance(PartitionState::IndexPrepared);

        let job = QueryBuilder::new(config)
            .with_jar(self.jar)
            .build(columns, partition, target);
        progress.advance(PartitionState::Loading);
        tracing::info!(
            job_name = %job.job_name,
            index = %index,
            "Loading {} into {}",
            progress.label,
            index
        );

        let started_at = Utc::now();
        let started = Instant::now();
        let exit = self.runner.run(&job).await?;
        let elapsed = started.elapsed();
        report.runs.push(JobRun {
            table: config.table.clone(),
            view: config.view.clone(),
            partition: partition.cloned(),
            target_index: index.clone(),
            exit,
            elapsed,
            started_at,
        });

        if exit.success() {
            tracing::info!(
                index = %index,
                logical_index = %target.logical_name(),
                elapsed_secs = elapsed.as_secs(),
                "Loaded {} into {} in {}s",
                progress.label,
                index,
                elapsed.as_secs()
            );
            lifecycle.refresh(&index).await;
            if let Some(alias) = &target.alias {
                lifecycle.alias(&index, alias).await;
            }
            if config.flags.optimize {
                lifecycle.optimize(&index).await;
            }
            return Ok(progress.finish(PartitionState::Succeeded, Some(exit)));
        }

        tracing::error!(
            index = %index,
            exit = %exit,
            elapsed_secs = elapsed.as_secs(),
            "Load of {} failed with {} after {}s",
            progress.label,
            exit,
            elapsed.as_secs()
        );
        if config.flags.delete_on_failure {
            lifecycle.delete(&index).await;
        }
        Ok(progress.finish(PartitionState::Failed, Some(exit)))
    }
}

/// Tracks one partition through its states.
struct Progress {
    report: PartitionReport,
    label: String,
}

impl Progress {
    fn new(partition: Option<&PartitionKeyValue>, index: &str) -> Self {
        let report = PartitionReport {
            partition: partition.cloned(),
            index: index.to_string(),
            state: PartitionState::NotStarted,
            exit: None,
        };
        let label = report.label();
        Self { report, label }
    }

    fn advance(&mut self, next: PartitionState) {
        tracing::debug!(
            partition = %self.label,
            from = %self.report.state,
            to = %next,
            "Partition state"
        );
        self.report.state = next;
    }

    fn finish(mut self, terminal: PartitionState, exit: Option<JobExit>) -> PartitionReport {
        debug_assert!(terminal.is_terminal());
        self.advance(terminal);
        self.report.exit = exit;
        self.report
    }
}
