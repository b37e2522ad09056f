//! Error types for the command-line loader.

use crate::config::ConfigError;
use hive2es_core::{ExitCode, Hive2EsError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Run(#[from] Hive2EsError),
}

impl CliError {
    /// Environment file problems are usage errors; everything else maps the
    /// way the run error says.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(_) => ExitCode::Unknown,
            CliError::Run(err) => err.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive2es_core::{ConfigError as RunConfigError, LoadError};

    #[test]
    fn test_exit_codes() {
        let err = CliError::from(ConfigError::InvalidValue {
            field: "hive.binary",
            reason: "must not be empty".to_string(),
        });
        assert_eq!(err.exit_code(), ExitCode::Unknown);

        let err = CliError::from(Hive2EsError::from(RunConfigError::MissingRequired {
            field: "--table".to_string(),
        }));
        assert_eq!(err.exit_code(), ExitCode::Unknown);

        let err = CliError::from(Hive2EsError::from(LoadError::PartialFailure {
            failed: 1,
            total: 3,
        }));
        assert_eq!(err.exit_code(), ExitCode::Critical);
        assert_eq!(err.to_string(), "Load error: 1 of 3 partitions failed to load");
    }
}
