//! hive2es Hive - Hive CLI Integration
//!
//! Everything that talks to Hive: schema and partition discovery through
//! the `MetadataProvider` seam, generation of the staging-table script, and
//! the `BatchRunner` that executes it.

pub mod cli;
pub mod jars;
pub mod metadata;
pub mod partitions;
pub mod query;
pub mod runner;
pub mod schema;

pub use cli::{HiveCli, DEFAULT_HIVE_BINARY};
pub use jars::{find_es_hadoop_jar, DEFAULT_JAR_SEARCH_PATHS};
pub use metadata::{
    parse_describe_output, parse_show_partitions, HiveMetadataProvider, MetadataProvider,
};
pub use partitions::{PartitionEnumerator, PartitionPlan};
pub use query::{HiveJob, QueryBuilder, JOB_NAME_PREFIX, STORAGE_HANDLER};
pub use runner::{BatchRunner, HiveBatchRunner};
pub use schema::{SchemaResolver, FALLBACK_COLUMN_TYPE};
