//! Run configuration.
//!
//! `RunOptions` is the raw, unchecked input (command-line flags merged with
//! the environment file). `RunConfig::from_options` validates it exactly
//! once; the resulting `RunConfig` is immutable and shared by reference
//! with every component for the lifetime of the run.

use crate::validate;
use crate::{ConfigError, PartitionKeyValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_QUEUE: &str = "default";
pub const DEFAULT_SHARDS: u32 = 5;
pub const DEFAULT_PORT: u16 = 9200;
pub const DEFAULT_NODE: &str = "localhost";
/// Pause after a failed partition before the next one is attempted.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(600);
/// Overall ceiling for a run. Large partitioned tables can take days.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 3600);

/// Behavioural switches for the load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFlags {
    pub recreate_index: bool,
    pub delete_on_failure: bool,
    pub skip_existing: bool,
    pub no_task_retries: bool,
    pub stop_on_failure: bool,
    pub optimize: bool,
}

/// Unvalidated run input.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub database: Option<String>,
    pub table: Option<String>,
    pub view: Option<String>,
    pub columns: Option<Vec<String>>,
    pub column_file: Option<PathBuf>,
    pub partition_key: Option<String>,
    pub partition_values: Option<Vec<String>>,
    pub index: Option<String>,
    pub doc_type: Option<String>,
    pub alias: Option<String>,
    pub shards: Option<u32>,
    pub queue: Option<String>,
    pub nodes: Option<Vec<String>>,
    pub port: Option<u16>,
    pub flags: LoadFlags,
    pub cooldown: Option<Duration>,
    pub timeout: Option<Duration>,
}

/// An Elasticsearch node endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    /// Parse `host` or `host:port`, falling back to `default_port`.
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        let (host, port) = match raw.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().ok().filter(|p| *p > 0).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        field: "--nodes".to_string(),
                        value: raw.to_string(),
                        reason: "port must be between 1 and 65535".to_string(),
                    }
                })?;
                (host, port)
            }
            None => (raw, default_port),
        };
        validate::host("--nodes", host)?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Partition selection requested by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionFilter {
    pub key: String,
    pub values: Vec<String>,
}

impl PartitionFilter {
    pub fn partitions(&self) -> Vec<PartitionKeyValue> {
        self.values
            .iter()
            .map(|v| PartitionKeyValue::new(self.key.clone(), v.clone()))
            .collect()
    }

    pub fn descriptors(&self) -> Vec<String> {
        self.partitions().iter().map(|p| p.descriptor()).collect()
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub database: String,
    pub table: String,
    pub view: Option<String>,
    /// Columns requested by the user, in requested order. `None` means all.
    pub columns: Option<Vec<String>>,
    pub partition_filter: Option<PartitionFilter>,
    pub index: String,
    pub doc_type: String,
    pub alias: Option<String>,
    pub shards: u32,
    pub queue: String,
    pub nodes: Vec<NodeAddr>,
    pub port: u16,
    pub flags: LoadFlags,
    pub cooldown: Duration,
    pub timeout: Duration,
}

impl RunConfig {
    pub fn from_options(options: RunOptions) -> Result<Self, ConfigError> {
        let table = options.table.ok_or_else(|| ConfigError::MissingRequired {
            field: "--table".to_string(),
        })?;
        validate::identifier("--table", &table)?;

        let database = options
            .database
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        validate::identifier("--database", &database)?;

        if let Some(view) = &options.view {
            validate::identifier("--view", view)?;
        }

        let columns = match (options.columns, options.column_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::IncompatibleOptions {
                    option_a: "--columns".to_string(),
                    option_b: "--column-file".to_string(),
                })
            }
            (Some(columns), None) => Some(normalize_columns(columns)?),
            (None, Some(path)) => Some(normalize_columns(read_column_file(&path)?)?),
            (None, None) => None,
        };

        let partition_filter = match (options.partition_key, options.partition_values) {
            (Some(key), Some(values)) => {
                validate::identifier("--partition-key", &key)?;
                let values: Vec<String> = values
                    .into_iter()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                if values.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "--partition-values".to_string(),
                        value: String::new(),
                        reason: "at least one value is required".to_string(),
                    });
                }
                for value in &values {
                    validate::partition_value("--partition-values", value)?;
                }
                Some(PartitionFilter {
                    key,
                    values: dedupe(values),
                })
            }
            (None, None) => None,
            _ => {
                return Err(ConfigError::RequiredTogether {
                    option_a: "--partition-key".to_string(),
                    option_b: "--partition-values".to_string(),
                })
            }
        };

        if options.flags.skip_existing && options.flags.recreate_index {
            return Err(ConfigError::IncompatibleOptions {
                option_a: "--skip-existing".to_string(),
                option_b: "--recreate-index".to_string(),
            });
        }

        let index = match options.index {
            Some(index) => index,
            None => options
                .view
                .as_deref()
                .unwrap_or(&table)
                .to_ascii_lowercase(),
        };
        validate::index_name("--index", &index)?;

        let doc_type = options.doc_type.unwrap_or_else(|| index.clone());
        validate::doc_type("--type", &doc_type)?;

        if let Some(alias) = &options.alias {
            validate::index_name("--alias", alias)?;
            if alias == &index {
                return Err(ConfigError::InvalidValue {
                    field: "--alias".to_string(),
                    value: alias.clone(),
                    reason: "must differ from --index".to_string(),
                });
            }
        }

        let shards = options.shards.unwrap_or(DEFAULT_SHARDS);
        validate::shards(shards)?;

        let queue = options.queue.unwrap_or_else(|| DEFAULT_QUEUE.to_string());
        validate::queue("--queue", &queue)?;

        let port = options.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "--port".to_string(),
                value: port.to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }

        let raw_nodes = options
            .nodes
            .unwrap_or_else(|| vec![DEFAULT_NODE.to_string()]);
        let nodes = raw_nodes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| NodeAddr::parse(n, port))
            .collect::<Result<Vec<_>, _>>()?;
        if nodes.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "--nodes".to_string(),
            });
        }

        let cooldown = options.cooldown.unwrap_or(DEFAULT_COOLDOWN);
        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "--timeout".to_string(),
                value: "0".to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            database,
            table,
            view: options.view,
            columns,
            partition_filter,
            index,
            doc_type,
            alias: options.alias,
            shards,
            queue,
            nodes,
            port,
            flags: options.flags,
            cooldown,
            timeout,
        })
    }

    /// The object columns are selected from: the view when given, else the table.
    pub fn source(&self) -> &str {
        self.view.as_deref().unwrap_or(&self.table)
    }

    /// `database.source`
    pub fn qualified_source(&self) -> String {
        format!("{}.{}", self.database, self.source())
    }

    /// `database.table`
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }

    /// Comma separated `host:port` list for the storage handler.
    pub fn node_list(&self) -> String {
        self.nodes
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn normalize_columns(columns: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let columns: Vec<String> = columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if columns.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "--columns".to_string(),
            value: String::new(),
            reason: "at least one column is required".to_string(),
        });
    }
    for column in &columns {
        validate::identifier("--columns", column)?;
    }
    Ok(dedupe(columns))
}

fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Read column names from a file.
///
/// Names may be separated by commas, whitespace or newlines. Blank lines and
/// anything after a `#` are ignored.
pub fn read_column_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(parse_column_list(&contents))
}

pub fn parse_column_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
