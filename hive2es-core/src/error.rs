//! Error types for hive2es operations

use crate::ExitCode;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Raised before anything external is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required option: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: '{value}' - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },

    #[error("Options must be given together: {option_a} and {option_b}")]
    RequiredTogether { option_a: String, option_b: String },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Failures of an external command (the Hive CLI, kinit).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("'{program}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("'{program}' produced unreadable output: {reason}")]
    InvalidOutput { program: String, reason: String },
}

/// Schema and partition discovery errors. Always fatal for the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("No columns found for {object} (does it exist?)")]
    SchemaNotFound { object: String },

    #[error("Column '{column}' not found in {object}, valid columns are: {}", .available.join(", "))]
    ColumnNotFound {
        column: String,
        object: String,
        available: Vec<String>,
    },

    #[error("Partition '{partition}' not found in {table}, valid partitions are: {}", .available.join(", "))]
    PartitionNotFound {
        partition: String,
        table: String,
        available: Vec<String>,
    },

    #[error("Partition '{descriptor}' in {table} does not match the expected key=value format")]
    InvalidPartitionFormat { descriptor: String, table: String },

    #[error("Partitions {} of {table} would all load into index '{index}'", .partitions.join(", "))]
    IndexCollision {
        index: String,
        table: String,
        partitions: Vec<String>,
    },

    #[error("Metadata lookup failed: {0}")]
    Command(#[from] CommandError),
}

/// Elasticsearch administrative API errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ElasticError {
    #[error("No Elasticsearch nodes configured")]
    NoNodes,

    #[error("Request to {node} failed: {reason}")]
    Transport { node: String, reason: String },

    #[error("{operation} on '{index}' returned HTTP {status}: {body}")]
    Status {
        operation: String,
        index: String,
        status: u16,
        body: String,
    },

    #[error("Invalid Elasticsearch client configuration: {reason}")]
    Client { reason: String },
}

/// Errors that end a load run after discovery succeeded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Load of {partition} into '{index}' failed with {exit} (stop-on-failure)")]
    PartitionFailed {
        partition: String,
        index: String,
        exit: String,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("Run exceeded the overall timeout of {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("{failed} of {total} partitions failed to load")]
    PartialFailure { failed: usize, total: usize },

    #[error("Batch job could not be started: {0}")]
    Command(#[from] CommandError),
}

/// Master error type for all hive2es errors.
#[derive(Debug, Clone, Error)]
pub enum Hive2EsError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Elasticsearch error: {0}")]
    Elastic(#[from] ElasticError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

impl Hive2EsError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Hive2EsError::Load(LoadError::PartitionFailed { .. })
            | Hive2EsError::Load(LoadError::PartialFailure { .. }) => ExitCode::Critical,
            _ => ExitCode::Unknown,
        }
    }
}

/// Result type alias for hive2es operations.
pub type Hive2EsResult<T> = Result<T, Hive2EsError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found_lists_alternatives() {
        let err = DiscoveryError::ColumnNotFound {
            column: "nope".to_string(),
            object: "default.sales".to_string(),
            available: vec!["id".to_string(), "amount".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'nope'"));
        assert!(msg.contains("default.sales"));
        assert!(msg.contains("id, amount"));
    }

    #[test]
    fn test_config_error_display_incompatible() {
        let err = ConfigError::IncompatibleOptions {
            option_a: "--skip-existing".to_string(),
            option_b: "--recreate-index".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("--skip-existing"));
        assert!(msg.contains("--recreate-index"));
    }

    #[test]
    fn test_timed_out_display_seconds() {
        let err = LoadError::TimedOut {
            timeout: Duration::from_secs(90),
        };
        assert!(err.to_string().contains("90s"));
    }

    #[test]
    fn test_exit_codes() {
        let critical = Hive2EsError::from(LoadError::PartitionFailed {
            partition: "dt=2020-01-01".to_string(),
            index: "sales_2020-01-01".to_string(),
            exit: "exit code 1".to_string(),
        });
        assert_eq!(critical.exit_code(), ExitCode::Critical);

        let partial = Hive2EsError::from(LoadError::PartialFailure { failed: 1, total: 3 });
        assert_eq!(partial.exit_code(), ExitCode::Critical);

        let interrupted = Hive2EsError::from(LoadError::Interrupted);
        assert_eq!(interrupted.exit_code(), ExitCode::Unknown);

        let discovery = Hive2EsError::from(DiscoveryError::SchemaNotFound {
            object: "default.missing".to_string(),
        });
        assert_eq!(discovery.exit_code(), ExitCode::Unknown);

        let config = Hive2EsError::from(ConfigError::MissingRequired {
            field: "--table".to_string(),
        });
        assert_eq!(config.exit_code(), ExitCode::Unknown);
    }

    #[test]
    fn test_discovery_error_from_command() {
        let err = DiscoveryError::from(CommandError::Spawn {
            program: "hive".to_string(),
            reason: "not found".to_string(),
        });
        assert!(matches!(err, DiscoveryError::Command(_)));
    }
}
