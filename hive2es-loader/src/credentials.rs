//! Kerberos ticket renewal between partitions.

use async_trait::async_trait;
use hive2es_core::{CommandError, JobExit};
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_KINIT_BINARY: &str = "kinit";

/// Refreshes whatever credentials the batch jobs run under.
///
/// Renewal is best-effort: the orchestrator logs a failure and carries on,
/// the job itself will fail if the ticket really expired.
#[async_trait]
pub trait CredentialRenewer: Send + Sync {
    async fn renew(&self) -> Result<(), CommandError>;
}

/// Runs `kinit -R` to renew an existing renewable ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinitRenewer {
    program: String,
}

impl Default for KinitRenewer {
    fn default() -> Self {
        Self::new(DEFAULT_KINIT_BINARY)
    }
}

impl KinitRenewer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CredentialRenewer for KinitRenewer {
    async fn renew(&self) -> Result<(), CommandError> {
        let output = Command::new(&self.program)
            .arg("-R")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CommandError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                program: self.program.clone(),
                status: JobExit::from(output.status).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
