//! The administrative capability the loader needs from Elasticsearch.

use async_trait::async_trait;
use hive2es_core::ElasticError;
use std::fmt;

/// Result of an administrative call.
///
/// `AlreadyInState` covers answers like "index already exists" on create or
/// "no such index" on delete: the cluster is already where the call wanted
/// it to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Success,
    AlreadyInState,
    Error(String),
}

impl AdminOutcome {
    pub fn is_satisfied(&self) -> bool {
        !matches!(self, AdminOutcome::Error(_))
    }
}

impl fmt::Display for AdminOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminOutcome::Success => write!(f, "success"),
            AdminOutcome::AlreadyInState => write!(f, "already in state"),
            AdminOutcome::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

impl From<ElasticError> for AdminOutcome {
    fn from(err: ElasticError) -> Self {
        AdminOutcome::Error(err.to_string())
    }
}

/// Index administration. Implementations keep no state between calls.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    async fn exists(&self, index: &str) -> Result<bool, ElasticError>;

    /// Create with `shards` primaries, zero replicas and refresh disabled.
    async fn create(&self, index: &str, shards: u32) -> AdminOutcome;

    async fn delete(&self, index: &str) -> AdminOutcome;

    /// Re-enable periodic refresh and make loaded documents searchable.
    async fn refresh(&self, index: &str) -> AdminOutcome;

    /// Point `alias` at `index`.
    async fn alias(&self, index: &str, alias: &str) -> AdminOutcome;

    /// Merge segments down after a load.
    async fn optimize(&self, index: &str) -> AdminOutcome;
}
