//! hive2es Core - Data Types, Configuration and Errors
//!
//! Plain data shared by the metadata, Elasticsearch, loader and CLI crates.
//! No I/O happens here apart from reading a column list file during
//! configuration validation.

pub mod config;
pub mod error;
pub mod exit;
pub mod model;
pub mod validate;

pub use config::{
    parse_column_list, read_column_file, LoadFlags, NodeAddr, PartitionFilter, RunConfig,
    RunOptions, DEFAULT_COOLDOWN, DEFAULT_DATABASE, DEFAULT_NODE, DEFAULT_PORT, DEFAULT_QUEUE,
    DEFAULT_SHARDS, DEFAULT_TIMEOUT,
};
pub use error::{
    CommandError, ConfigError, DiscoveryError, ElasticError, Hive2EsError, Hive2EsResult,
    LoadError,
};
pub use exit::ExitCode;
pub use model::{ColumnDefinition, ColumnSet, IndexTarget, JobExit, JobRun, PartitionKeyValue};
