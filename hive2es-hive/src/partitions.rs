//! Partition discovery and selection.

use crate::metadata::MetadataProvider;
use hive2es_core::{DiscoveryError, IndexTarget, PartitionKeyValue, RunConfig};
use std::collections::BTreeMap;

/// The partitions a run will process, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionPlan {
    pub partitions: Vec<PartitionKeyValue>,
    /// Number of partitions the table has, regardless of the filter.
    pub discovered: usize,
}

impl PartitionPlan {
    pub fn unpartitioned() -> Self {
        Self::default()
    }

    pub fn is_partitioned(&self) -> bool {
        self.discovered > 0
    }

    /// Each partition gets its own physical index once the table has more
    /// than one partition.
    pub fn suffix_indices(&self) -> bool {
        self.discovered > 1
    }

    /// Number of load iterations: one per partition, or one for the whole
    /// table.
    pub fn iterations(&self) -> usize {
        self.partitions.len().max(1)
    }
}

pub struct PartitionEnumerator<'a> {
    provider: &'a dyn MetadataProvider,
}

impl<'a> PartitionEnumerator<'a> {
    pub fn new(provider: &'a dyn MetadataProvider) -> Self {
        Self { provider }
    }

    pub async fn enumerate(&self, config: &RunConfig) -> Result<PartitionPlan, DiscoveryError> {
        let table = config.qualified_table();
        let discovered = self
            .provider
            .list_partitions(&config.database, &config.table)
            .await?;
        tracing::debug!(table, partitions = discovered.len(), "Partitions listed");
        if discovered.len() > 1 {
            check_index_collisions(config, &table, &discovered)?;
        }

        if let Some(filter) = &config.partition_filter {
            for descriptor in filter.descriptors() {
                if !discovered.iter().any(|d| d == &descriptor) {
                    return Err(DiscoveryError::PartitionNotFound {
                        partition: descriptor,
                        table,
                        available: discovered,
                    });
                }
            }
            return Ok(PartitionPlan {
                partitions: filter.partitions(),
                discovered: discovered.len(),
            });
        }

        let partitions = discovered
            .iter()
            .map(|descriptor| {
                PartitionKeyValue::parse(descriptor).ok_or_else(|| {
                    DiscoveryError::InvalidPartitionFormat {
                        descriptor: descriptor.clone(),
                        table: table.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PartitionPlan {
            discovered: partitions.len(),
            partitions,
        })
    }
}

/// Index names are lowercase, so partition values differing only in case
/// would share a physical index. Refuse such tables up front.
fn check_index_collisions(
    config: &RunConfig,
    table: &str,
    descriptors: &[String],
) -> Result<(), DiscoveryError> {
    let mut by_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for descriptor in descriptors {
        let Some(partition) = PartitionKeyValue::parse(descriptor) else {
            continue;
        };
        let index = IndexTarget::new(config.index.clone(), config.shards)
            .with_suffix(partition.value)
            .name();
        by_index.entry(index).or_default().push(descriptor.clone());
    }
    match by_index.into_iter().find(|(_, partitions)| partitions.len() > 1) {
        Some((index, partitions)) => Err(DiscoveryError::IndexCollision {
            index,
            table: table.to_string(),
            partitions,
        }),
        None => Ok(()),
    }
}
