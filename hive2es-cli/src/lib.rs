//! hive2es command-line loader.

pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod logging;
