//! Command-line surface.

use crate::config::EnvConfig;
use clap::Parser;
use hive2es_core::{LoadFlags, RunOptions, DEFAULT_DATABASE, DEFAULT_PORT, DEFAULT_QUEUE, DEFAULT_SHARDS};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "hive-to-elasticsearch")]
#[command(about = "Index a Hive table into Elasticsearch, one partition at a time")]
#[command(version)]
pub struct Args {
    /// Hive database holding the table
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Hive table to index
    #[arg(short, long)]
    pub table: String,

    /// View to select columns from instead of the table
    #[arg(long)]
    pub view: Option<String>,

    /// Columns to index, comma separated (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// File listing the columns to index
    #[arg(long)]
    pub column_file: Option<PathBuf>,

    /// Partition key to restrict the load to
    #[arg(long)]
    pub partition_key: Option<String>,

    /// Partition values to load, comma separated
    #[arg(long, value_delimiter = ',')]
    pub partition_values: Option<Vec<String>>,

    /// Target index (default: table or view name)
    #[arg(short, long)]
    pub index: Option<String>,

    /// Document type (default: index name)
    #[arg(long = "type")]
    pub doc_type: Option<String>,

    /// Alias bound to every loaded index
    #[arg(short, long)]
    pub alias: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_SHARDS)]
    pub shards: u32,

    /// YARN queue for the load jobs
    #[arg(short, long, default_value = DEFAULT_QUEUE)]
    pub queue: String,

    /// Elasticsearch nodes, comma separated host[:port]
    #[arg(short, long, value_delimiter = ',')]
    pub nodes: Option<Vec<String>>,

    /// Port for nodes given without one
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Delete and recreate existing indices
    #[arg(long)]
    pub recreate_index: bool,

    /// Delete an index whose load failed
    #[arg(long)]
    pub delete_on_failure: bool,

    /// Leave existing indices alone and skip their load
    #[arg(long)]
    pub skip_existing: bool,

    /// Give MapReduce tasks a single attempt
    #[arg(long)]
    pub no_task_retries: bool,

    /// Stop at the first failed partition
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Force-merge each index after loading
    #[arg(long)]
    pub optimize: bool,

    /// Environment file (TOML); falls back to $HIVE2ES_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overall run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Raw run options; validation happens in `RunConfig::from_options`.
    pub fn to_options(&self, env: &EnvConfig) -> RunOptions {
        RunOptions {
            database: Some(self.database.clone()),
            table: Some(self.table.clone()),
            view: self.view.clone(),
            columns: self.columns.clone(),
            column_file: self.column_file.clone(),
            partition_key: self.partition_key.clone(),
            partition_values: self.partition_values.clone(),
            index: self.index.clone(),
            doc_type: self.doc_type.clone(),
            alias: self.alias.clone(),
            shards: Some(self.shards),
            queue: Some(self.queue.clone()),
            nodes: self.nodes.clone(),
            port: Some(self.port),
            flags: self.flags(),
            cooldown: Some(Duration::from_secs(env.loader.cooldown_secs)),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }

    pub fn flags(&self) -> LoadFlags {
        LoadFlags {
            recreate_index: self.recreate_index,
            delete_on_failure: self.delete_on_failure,
            skip_existing: self.skip_existing,
            no_task_retries: self.no_task_retries,
            stop_on_failure: self.stop_on_failure,
            optimize: self.optimize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["hive-to-elasticsearch", "--table", "sales"]).unwrap();
        let options = args.to_options(&EnvConfig::default());
        assert_eq!(options.database.as_deref(), Some("default"));
        assert_eq!(options.queue.as_deref(), Some("default"));
        assert_eq!(options.shards, Some(5));
        assert_eq!(options.port, Some(9200));
        assert_eq!(options.nodes, None);
        assert_eq!(options.cooldown, Some(Duration::from_secs(600)));
        assert_eq!(options.timeout, None);
        assert_eq!(options.flags, LoadFlags::default());
    }

    #[test]
    fn test_lists_and_flags() {
        let args = Args::try_parse_from([
            "hive-to-elasticsearch",
            "-t",
            "sales",
            "--columns",
            "id,amount",
            "--partition-key",
            "dt",
            "--partition-values",
            "2020-01-01,2020-01-02",
            "--nodes",
            "es1:9201,es2",
            "--type",
            "sale",
            "--recreate-index",
            "--stop-on-failure",
            "--timeout",
            "3600",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let options = args.to_options(&EnvConfig::default());
        assert_eq!(options.columns, Some(vec!["id".to_string(), "amount".to_string()]));
        assert_eq!(
            options.partition_values,
            Some(vec!["2020-01-01".to_string(), "2020-01-02".to_string()])
        );
        assert_eq!(options.nodes, Some(vec!["es1:9201".to_string(), "es2".to_string()]));
        assert_eq!(options.doc_type.as_deref(), Some("sale"));
        assert!(options.flags.recreate_index);
        assert!(options.flags.stop_on_failure);
        assert!(!options.flags.skip_existing);
        assert_eq!(options.timeout, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_table_is_required() {
        assert!(Args::try_parse_from(["hive-to-elasticsearch"]).is_err());
    }
}
