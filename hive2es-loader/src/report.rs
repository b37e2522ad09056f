//! What a run did, partition by partition.

use hive2es_core::{JobExit, JobRun, LoadError, PartitionKeyValue};
use std::fmt;
use uuid::Uuid;

/// Per-partition lifecycle.
///
/// `NotStarted -> ColumnsResolved -> IndexPrepared -> Loading` and then one
/// of the terminal states. `Skipped` is the skip-existing short-circuit and
/// counts as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionState {
    NotStarted,
    ColumnsResolved,
    IndexPrepared,
    Loading,
    Succeeded,
    Skipped,
    Failed,
}

impl PartitionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PartitionState::Succeeded | PartitionState::Skipped | PartitionState::Failed
        )
    }

    pub fn is_success(self) -> bool {
        matches!(self, PartitionState::Succeeded | PartitionState::Skipped)
    }
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartitionState::NotStarted => "not started",
            PartitionState::ColumnsResolved => "columns resolved",
            PartitionState::IndexPrepared => "index prepared",
            PartitionState::Loading => "loading",
            PartitionState::Succeeded => "succeeded",
            PartitionState::Skipped => "skipped",
            PartitionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Final state of one partition (or of the whole table when unpartitioned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub partition: Option<PartitionKeyValue>,
    pub index: String,
    pub state: PartitionState,
    pub exit: Option<JobExit>,
}

impl PartitionReport {
    /// `dt=2020-01-01`, or `<table>` for an unpartitioned load.
    pub fn label(&self) -> String {
        self.partition
            .as_ref()
            .map(PartitionKeyValue::descriptor)
            .unwrap_or_else(|| "<table>".to_string())
    }
}

/// Why a run stopped before processing every partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Interrupted,
    StopOnFailure {
        partition: String,
        index: String,
        exit: JobExit,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Correlates every log line of one run.
    pub run_id: Uuid,
    /// Partitions the run set out to process.
    pub planned: usize,
    pub partitions: Vec<PartitionReport>,
    /// Every batch job that was actually started.
    pub runs: Vec<JobRun>,
    pub aborted: Option<AbortReason>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.partitions
            .iter()
            .filter(|p| p.state.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.partitions
            .iter()
            .filter(|p| p.state == PartitionState::Failed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.partitions
            .iter()
            .filter(|p| p.state == PartitionState::Skipped)
            .count()
    }

    /// Map the report to the run's overall result: an abort wins, then any
    /// failed partition.
    pub fn into_result(self) -> Result<Self, LoadError> {
        match &self.aborted {
            Some(AbortReason::Interrupted) => return Err(LoadError::Interrupted),
            Some(AbortReason::StopOnFailure {
                partition,
                index,
                exit,
            }) => {
                return Err(LoadError::PartitionFailed {
                    partition: partition.clone(),
                    index: index.clone(),
                    exit: exit.to_string(),
                })
            }
            None => {}
        }
        let failed = self.failed();
        if failed > 0 {
            return Err(LoadError::PartialFailure {
                failed,
                total: self.planned,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(state: PartitionState) -> PartitionReport {
        PartitionReport {
            partition: Some(PartitionKeyValue::new("dt", "2020-01-01")),
            index: "sales_2020-01-01".to_string(),
            state,
            exit: None,
        }
    }

    #[test]
    fn test_counts() {
        let run = RunReport {
            planned: 3,
            partitions: vec![
                report(PartitionState::Succeeded),
                report(PartitionState::Skipped),
                report(PartitionState::Failed),
            ],
            ..RunReport::default()
        };
        assert_eq!(run.succeeded(), 2);
        assert_eq!(run.skipped(), 1);
        assert_eq!(run.failed(), 1);
    }

    #[test]
    fn test_into_result_reports_partial_failure() {
        let run = RunReport {
            planned: 2,
            partitions: vec![
                report(PartitionState::Succeeded),
                report(PartitionState::Failed),
            ],
            ..RunReport::default()
        };
        assert_eq!(
            run.into_result().unwrap_err(),
            LoadError::PartialFailure {
                failed: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_into_result_prefers_abort_reason() {
        let run = RunReport {
            planned: 2,
            partitions: vec![report(PartitionState::Failed)],
            aborted: Some(AbortReason::Interrupted),
            ..RunReport::default()
        };
        assert_eq!(run.into_result().unwrap_err(), LoadError::Interrupted);

        let run = RunReport {
            planned: 2,
            partitions: vec![report(PartitionState::Failed)],
            aborted: Some(AbortReason::StopOnFailure {
                partition: "dt=2020-01-01".to_string(),
                index: "sales_2020-01-01".to_string(),
                exit: JobExit::code(1),
            }),
            ..RunReport::default()
        };
        assert!(matches!(
            run.into_result(),
            Err(LoadError::PartitionFailed { exit, .. }) if exit == "exit code 1"
        ));
    }

    #[test]
    fn test_into_result_ok_when_all_succeeded() {
        let run = RunReport {
            planned: 1,
            partitions: vec![report(PartitionState::Skipped)],
            ..RunReport::default()
        };
        assert!(run.into_result().is_ok());
    }

    #[test]
    fn test_label_for_unpartitioned_load() {
        let mut partition = report(PartitionState::Succeeded);
        assert_eq!(partition.label(), "dt=2020-01-01");
        partition.partition = None;
        assert_eq!(partition.label(), "<table>");
    }
}
