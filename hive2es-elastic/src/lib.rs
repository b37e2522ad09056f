//! hive2es Elastic - Index Lifecycle Management
//!
//! `IndexAdmin` is the capability (exists/create/delete/refresh/alias/
//! optimize); `ElasticsearchAdmin` implements it over the REST API with node
//! failover; `IndexLifecycle` applies the best-effort policy on top.

pub mod admin;
pub mod client;
pub mod lifecycle;

pub use admin::{AdminOutcome, IndexAdmin};
pub use client::{ElasticSettings, ElasticsearchAdmin, NodeResponse};
pub use lifecycle::IndexLifecycle;
