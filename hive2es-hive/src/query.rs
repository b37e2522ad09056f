//! Generation of the Hive script that pushes one partition into an index.
//!
//! The script routes a plain `INSERT OVERWRITE ... SELECT` through an
//! external staging table backed by the elasticsearch-hadoop storage handler.
//! The staging table holds no data; it only carries the index/type/node
//! binding, so it is dropped and recreated on every invocation.

use hive2es_core::{ColumnSet, IndexTarget, PartitionKeyValue, RunConfig};
use std::path::Path;

pub const STORAGE_HANDLER: &str = "org.elasticsearch.hadoop.hive.EsStorageHandler";
pub const JOB_NAME_PREFIX: &str = "hive-to-elasticsearch";

const SPECULATIVE_SETTINGS: [&str; 4] = [
    "mapreduce.map.speculative",
    "mapreduce.reduce.speculative",
    "mapred.map.tasks.speculative.execution",
    "mapred.reduce.tasks.speculative.execution",
];

const MAX_ATTEMPT_SETTINGS: [&str; 4] = [
    "mapreduce.map.maxattempts",
    "mapreduce.reduce.maxattempts",
    "mapred.map.max.attempts",
    "mapred.reduce.max.attempts",
];

/// A ready-to-run Hive batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveJob {
    pub job_name: String,
    pub queue: String,
    pub statements: Vec<String>,
}

impl HiveJob {
    /// The statements as one `-e` script.
    pub fn script(&self) -> String {
        let mut script = self.statements.join(";\n");
        script.push(';');
        script
    }

    /// Engine settings passed alongside the script (`--hiveconf`).
    pub fn settings(&self) -> Vec<(String, String)> {
        vec![
            ("mapreduce.job.name".to_string(), self.job_name.clone()),
            ("mapred.job.name".to_string(), self.job_name.clone()),
            ("mapreduce.job.queuename".to_string(), self.queue.clone()),
            ("mapred.job.queue.name".to_string(), self.queue.clone()),
            ("tez.queue.name".to_string(), self.queue.clone()),
        ]
    }
}

pub struct QueryBuilder<'a> {
    config: &'a RunConfig,
    jar: Option<&'a Path>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config, jar: None }
    }

    /// Register the elasticsearch-hadoop jar with `ADD JAR`.
    pub fn with_jar(mut self, jar: Option<&'a Path>) -> Self {
        self.jar = jar;
        self
    }

    /// Name of the staging table, in the source database.
    pub fn staging_table(&self) -> String {
        format!(
            "`{}`.`{}_to_elasticsearch`",
            self.config.database,
            self.config.source()
        )
    }

    pub fn job_name(&self, partition: Option<&PartitionKeyValue>, index: &IndexTarget) -> String {
        let mut name = format!("{}={}", JOB_NAME_PREFIX, self.config.qualified_source());
        if let Some(partition) = partition {
            name.push('=');
            name.push_str(&partition.descriptor());
        }
        name.push_str(&format!("=>{}/{}", index.name(), self.config.doc_type));
        name
    }

    pub fn build(
        &self,
        columns: &ColumnSet,
        partition: Option<&PartitionKeyValue>,
        index: &IndexTarget,
    ) -> HiveJob {
        let config = self.config;
        let staging = self.staging_table();
        let mut statements = Vec::new();

        if let Some(jar) = self.jar {
            statements.push(format!("ADD JAR {}", jar.display()));
        }
        for key in SPECULATIVE_SETTINGS {
            statements.push(format!("SET {}=false", key));
        }
        if config.flags.no_task_retries {
            for key in MAX_ATTEMPT_SETTINGS {
                statements.push(format!("SET {}=1", key));
            }
        }

        statements.push(format!("DROP TABLE IF EXISTS {}", staging));

        let declarations = columns
            .iter()
            .map(|c| format!("    `{}` {}", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(",\n");
        statements.push(format!(
            "CREATE EXTERNAL TABLE {staging} (\n{declarations}\n)\n\
             STORED BY '{handler}'\n\
             TBLPROPERTIES (\n    \
             'es.resource' = '{index}/{doc_type}',\n    \
             'es.nodes' = '{nodes}',\n    \
             'es.port' = '{port}',\n    \
             'es.index.auto.create' = 'true'\n)",
            staging = staging,
            declarations = declarations,
            handler = STORAGE_HANDLER,
            index = index.name(),
            doc_type = config.doc_type,
            nodes = config.node_list(),
            port = config.port,
        ));

        let selection = columns
            .iter()
            .map(|c| format!("`{}`", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut insert = format!(
            "INSERT OVERWRITE TABLE {} SELECT {} FROM `{}`.`{}`",
            staging,
            selection,
            config.database,
            config.source()
        );
        if let Some(partition) = partition {
            insert.push_str(&format!(" WHERE {}", partition.predicate()));
        }
        statements.push(insert);

        HiveJob {
            job_name: self.job_name(partition, index),
            queue: config.queue.clone(),
            statements,
        }
    }
}
