//! Environment file for the loader.
//!
//! Describes the machine the loader runs on (Hive binary, Elasticsearch
//! client settings, Kerberos, jar locations), as opposed to the per-run
//! flags on the command line. Every section is optional and falls back to
//! defaults that match a stock Hadoop edge node.

use hive2es_core::DEFAULT_COOLDOWN;
use hive2es_elastic::ElasticSettings;
use hive2es_hive::{DEFAULT_HIVE_BINARY, DEFAULT_JAR_SEARCH_PATHS};
use hive2es_loader::DEFAULT_KINIT_BINARY;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "HIVE2ES_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EnvConfig {
    pub hive: HiveConfig,
    pub elasticsearch: ElasticSettings,
    pub kerberos: KerberosConfig,
    pub jars: JarsConfig,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HiveConfig {
    pub binary: String,
    /// Arguments placed before `--hiveconf` and `-e`.
    pub args: Vec<String>,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_HIVE_BINARY.to_string(),
            args: vec!["-S".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct KerberosConfig {
    /// Renew the ticket with `kinit -R` before each partition.
    pub enabled: bool,
    pub kinit_binary: String,
}

impl Default for KerberosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kinit_binary: DEFAULT_KINIT_BINARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct JarsConfig {
    /// Directories searched, in order, for the elasticsearch-hadoop jar.
    pub search_paths: Vec<PathBuf>,
}

impl Default for JarsConfig {
    fn default() -> Self {
        Self {
            search_paths: DEFAULT_JAR_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoaderConfig {
    /// Pause after a failed partition before starting the next one.
    pub cooldown_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN.as_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl EnvConfig {
    /// Load from `path`, else from `$HIVE2ES_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(config_path_from_env);
        let config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hive.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "hive.binary",
                reason: "must not be empty".to_string(),
            });
        }
        if self.elasticsearch.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "elasticsearch.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.elasticsearch.optimize_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "elasticsearch.optimize_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.elasticsearch.scheme != "http" && self.elasticsearch.scheme != "https" {
            return Err(ConfigError::InvalidValue {
                field: "elasticsearch.scheme",
                reason: "must be 'http' or 'https'".to_string(),
            });
        }
        if self.elasticsearch.password.is_some() && self.elasticsearch.username.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "elasticsearch.password",
                reason: "requires elasticsearch.username".to_string(),
            });
        }
        if self.kerberos.enabled && self.kerberos.kinit_binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "kerberos.kinit_binary",
                reason: "must not be empty when kerberos is enabled".to_string(),
            });
        }
        if self
            .jars
            .search_paths
            .iter()
            .any(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "jars.search_paths",
                reason: "must not contain empty paths".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = EnvConfig::from_toml("").unwrap();
        assert_eq!(config, EnvConfig::default());
        assert_eq!(config.hive.binary, "hive");
        assert_eq!(config.hive.args, vec!["-S"]);
        assert!(config.kerberos.enabled);
        assert_eq!(config.loader.cooldown_secs, 600);
        assert_eq!(config.elasticsearch.scheme, "http");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = EnvConfig::from_toml(
            r#"
            [hive]
            binary = "/opt/hive/bin/beeline-wrapper"

            [elasticsearch]
            scheme = "https"
            username = "loader"
            password = "secret"

            [kerberos]
            enabled = false

            [jars]
            search_paths = ["/opt/jars"]

            [loader]
            cooldown_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.hive.binary, "/opt/hive/bin/beeline-wrapper");
        assert_eq!(config.hive.args, vec!["-S"]);
        assert_eq!(config.elasticsearch.scheme, "https");
        assert_eq!(config.elasticsearch.request_timeout_ms, 60_000);
        assert!(!config.kerberos.enabled);
        assert_eq!(config.kerberos.kinit_binary, "kinit");
        assert_eq!(config.jars.search_paths, vec![PathBuf::from("/opt/jars")]);
        assert_eq!(config.loader.cooldown_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            EnvConfig::from_toml("[hive]\nbinnary = \"hive\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EnvConfig::from_toml("[metrics]\nenabled = true\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EnvConfig::default();
        config.elasticsearch.scheme = "ftp".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "elasticsearch.scheme", .. })
        ));

        let mut config = EnvConfig::default();
        config.elasticsearch.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EnvConfig::default();
        config.elasticsearch.optimize_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "elasticsearch.optimize_timeout_ms", .. })
        ));

        let mut config = EnvConfig::default();
        config.hive.binary = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = EnvConfig::default();
        config.elasticsearch.password = Some("secret".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "elasticsearch.password", .. })
        ));
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = EnvConfig::from_path(Path::new("/nonexistent/hive2es.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/hive2es.toml"));
    }
}
