//! Thin wrapper around the `hive` command-line client.

use hive2es_core::{CommandError, JobExit};
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_HIVE_BINARY: &str = "hive";

/// How to invoke the Hive CLI.
///
/// Discovery queries capture stdout; batch jobs inherit the terminal so the
/// MapReduce/Tez progress Hive prints stays visible to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveCli {
    program: String,
    base_args: Vec<String>,
}

impl Default for HiveCli {
    fn default() -> Self {
        Self::new(DEFAULT_HIVE_BINARY, vec!["-S".to_string()])
    }
}

impl HiveCli {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Full argument list for running `query` with the given `--hiveconf`
    /// settings.
    pub fn args_for(&self, query: &str, settings: &[(String, String)]) -> Vec<String> {
        let mut args = self.base_args.clone();
        for (key, value) in settings {
            args.push("--hiveconf".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push("-e".to_string());
        args.push(query.to_string());
        args
    }

    /// Run a query and return its stdout. A non-zero exit is an error
    /// carrying stderr.
    pub async fn capture(&self, query: &str) -> Result<String, CommandError> {
        let args = self.args_for(query, &[]);
        tracing::debug!(program = %self.program, query, "Running Hive query");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                program: self.program.clone(),
                status: JobExit::from(output.status).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidOutput {
            program: self.program.clone(),
            reason: e.to_string(),
        })
    }

    /// Run a query to completion with inherited stdout/stderr and report how
    /// the process ended. Only a failure to start the process is an error.
    pub async fn run(
        &self,
        query: &str,
        settings: &[(String, String)],
    ) -> Result<JobExit, CommandError> {
        let args = self.args_for(query, settings);
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(JobExit::from(status))
    }

    fn spawn_error(&self, err: std::io::Error) -> CommandError {
        CommandError::Spawn {
            program: self.program.clone(),
            reason: err.to_string(),
        }
    }
}
