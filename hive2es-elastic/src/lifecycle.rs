//! Best-effort index lifecycle.
//!
//! Administrative calls never abort a run: only the bulk load itself decides
//! whether a partition failed. This wrapper makes that policy explicit by
//! logging every `Error` outcome as a warning and handing the outcome back
//! for the caller to report.

use crate::admin::{AdminOutcome, IndexAdmin};
use std::time::Instant;

pub struct IndexLifecycle<'a> {
    admin: &'a dyn IndexAdmin,
}

impl<'a> IndexLifecycle<'a> {
    pub fn new(admin: &'a dyn IndexAdmin) -> Self {
        Self { admin }
    }

    /// Whether `index` exists. A failed lookup is logged and reported as
    /// absent.
    pub async fn exists(&self, index: &str) -> bool {
        match self.admin.exists(index).await {
            Ok(exists) => exists,
            Err(err) => {
                tracing::warn!(index, error = %err, "Could not check whether index exists, assuming it does not");
                false
            }
        }
    }

    pub async fn create(&self, index: &str, shards: u32) -> AdminOutcome {
        let started = Instant::now();
        let outcome = self.admin.create(index, shards).await;
        report("create", index, &outcome, started);
        outcome
    }

    pub async fn delete(&self, index: &str) -> AdminOutcome {
        let started = Instant::now();
        let outcome = self.admin.delete(index).await;
        report("delete", index, &outcome, started);
        outcome
    }

    pub async fn refresh(&self, index: &str) -> AdminOutcome {
        let started = Instant::now();
        let outcome = self.admin.refresh(index).await;
        report("refresh", index, &outcome, started);
        outcome
    }

    pub async fn alias(&self, index: &str, alias: &str) -> AdminOutcome {
        let started = Instant::now();
        let outcome = self.admin.alias(index, alias).await;
        match &outcome {
            AdminOutcome::Error(reason) => {
                tracing::warn!(index, alias, reason = %reason, "Failed to alias index");
            }
            _ => {
                tracing::info!(
                    index,
                    alias,
                    outcome = %outcome,
                    elapsed_secs = started.elapsed().as_secs(),
                    "Aliased index '{}' as '{}'",
                    index,
                    alias
                );
            }
        }
        outcome
    }

    pub async fn optimize(&self, index: &str) -> AdminOutcome {
        let started = Instant::now();
        let outcome = self.admin.optimize(index).await;
        report("optimize", index, &outcome, started);
        outcome
    }
}

fn report(operation: &str, index: &str, outcome: &AdminOutcome, started: Instant) {
    let elapsed_secs = started.elapsed().as_secs();
    match outcome {
        AdminOutcome::Error(reason) => {
            tracing::warn!(operation, index, reason = %reason, elapsed_secs, "Index {} failed, continuing", operation);
        }
        AdminOutcome::AlreadyInState => {
            tracing::info!(operation, index, elapsed_secs, "Index {}: already done", operation);
        }
        AdminOutcome::Success => {
            tracing::info!(operation, index, elapsed_secs, "Index {} done in {}s", operation, elapsed_secs);
        }
    }
}
