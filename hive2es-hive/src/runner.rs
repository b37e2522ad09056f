//! Batch job execution.

use crate::cli::HiveCli;
use crate::query::HiveJob;
use async_trait::async_trait;
use hive2es_core::{CommandError, JobExit};

/// Runs a generated job synchronously and reports how it ended.
///
/// A job that starts and then fails is `Ok` with a non-success `JobExit`;
/// `Err` is reserved for jobs that could not be started at all.
#[async_trait]
pub trait BatchRunner: Send + Sync {
    async fn run(&self, job: &HiveJob) -> Result<JobExit, CommandError>;
}

#[derive(Debug, Clone, Default)]
pub struct HiveBatchRunner {
    cli: HiveCli,
}

impl HiveBatchRunner {
    pub fn new(cli: HiveCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl BatchRunner for HiveBatchRunner {
    async fn run(&self, job: &HiveJob) -> Result<JobExit, CommandError> {
        let script = job.script();
        tracing::debug!(job_name = %job.job_name, queue = %job.queue, "Hive script:\n{}", script);
        self.cli.run(&script, &job.settings()).await
    }
}
