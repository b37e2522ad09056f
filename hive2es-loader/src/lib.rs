//! hive2es Loader - Partition Indexing Orchestration
//!
//! Ties discovery, query generation, index administration and batch jobs
//! together into one sequential run:
//! - `Orchestrator` walks the partition plan and applies the load policy
//! - `Cooldown` and `ShutdownSignal` handle backoff and interrupts
//! - `CredentialRenewer` keeps Kerberos tickets fresh between partitions

pub mod cooldown;
pub mod credentials;
pub mod orchestrator;
pub mod report;
pub mod shutdown;

pub use cooldown::{Cooldown, CooldownOutcome};
pub use credentials::{CredentialRenewer, KinitRenewer, DEFAULT_KINIT_BINARY};
pub use orchestrator::Orchestrator;
pub use report::{AbortReason, PartitionReport, PartitionState, RunReport};
pub use shutdown::ShutdownSignal;
