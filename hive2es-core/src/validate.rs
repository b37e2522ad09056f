//! Charset validation for user-supplied identifiers.
//!
//! Everything that ends up inside a generated Hive statement or an
//! Elasticsearch URL path goes through one of these checks first.

use crate::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("identifier regex"));
static INDEX_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.+-]*$").expect("index regex"));
static DOC_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("type regex"));
static QUEUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("queue regex"));
static PARTITION_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:+-]+$").expect("partition value regex"));
static HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("host regex"));

/// Strict `key=value` partition descriptor.
pub static PARTITION_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)=([A-Za-z0-9_.:+-]+)$").expect("partition descriptor regex")
});

/// Maximum number of primary shards accepted for a new index.
pub const MAX_SHARDS: u32 = 1000;

fn check(re: &Regex, field: &str, value: &str, reason: &str) -> Result<(), ConfigError> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// Database, table, view, column and partition key names.
pub fn identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    check(&IDENTIFIER, field, value, "must be alphanumeric or underscore")
}

/// Elasticsearch index and alias names.
pub fn index_name(field: &str, value: &str) -> Result<(), ConfigError> {
    check(
        &INDEX_NAME,
        field,
        value,
        "must be lowercase alphanumeric, '_', '.', '+' or '-' and not start with a symbol",
    )
}

pub fn doc_type(field: &str, value: &str) -> Result<(), ConfigError> {
    check(&DOC_TYPE, field, value, "must be alphanumeric, '_' or '-'")
}

pub fn queue(field: &str, value: &str) -> Result<(), ConfigError> {
    check(&QUEUE, field, value, "must be alphanumeric, '_', '.' or '-'")
}

pub fn partition_value(field: &str, value: &str) -> Result<(), ConfigError> {
    check(
        &PARTITION_VALUE,
        field,
        value,
        "must be alphanumeric, '_', '.', ':', '+' or '-'",
    )
}

pub fn host(field: &str, value: &str) -> Result<(), ConfigError> {
    check(&HOST, field, value, "must be a hostname or IP address")
}

pub fn shards(value: u32) -> Result<(), ConfigError> {
    if (1..=MAX_SHARDS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "--shards".to_string(),
            value: value.to_string(),
            reason: format!("must be between 1 and {}", MAX_SHARDS),
        })
    }
}
