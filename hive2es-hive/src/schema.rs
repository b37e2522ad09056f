//! Schema resolution: which columns get exported, with which types.

use crate::metadata::MetadataProvider;
use hive2es_core::{ColumnDefinition, ColumnSet, DiscoveryError, RunConfig};

/// Type declared in the staging table for a view column that `DESCRIBE`
/// did not report.
pub const FALLBACK_COLUMN_TYPE: &str = "string";

pub struct SchemaResolver<'a> {
    provider: &'a dyn MetadataProvider,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(provider: &'a dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// Resolve the exported columns for this run.
    ///
    /// The view is described when present, else the table. Requested
    /// columns are checked strictly against a table. With a view the check
    /// is skipped: a view may rename or compute columns, and a wrong name
    /// surfaces as a failed Hive job instead of a local error.
    pub async fn resolve(&self, config: &RunConfig) -> Result<ColumnSet, DiscoveryError> {
        let object = config.qualified_source();
        let described: ColumnSet = self
            .provider
            .describe_columns(&config.database, config.source())
            .await?
            .into_iter()
            .collect();

        if described.is_empty() {
            return Err(DiscoveryError::SchemaNotFound { object });
        }
        tracing::debug!(object, columns = described.len(), "Schema described");

        let Some(requested) = &config.columns else {
            return Ok(described);
        };

        let mut selected = ColumnSet::new();
        for name in requested {
            match described.get(name) {
                Some(column) => {
                    selected.push(column.clone());
                }
                None if config.view.is_some() => {
                    tracing::warn!(
                        column = %name,
                        view = %object,
                        "Column not reported by DESCRIBE, declaring it as {}",
                        FALLBACK_COLUMN_TYPE
                    );
                    selected.push(ColumnDefinition::new(name.clone(), FALLBACK_COLUMN_TYPE));
                }
                None => {
                    return Err(DiscoveryError::ColumnNotFound {
                        column: name.clone(),
                        object,
                        available: described.names(),
                    });
                }
            }
        }
        Ok(selected)
    }
}
