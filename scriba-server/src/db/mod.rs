//! Database access for scriba-server
//!
//! Query modules per entity; timestamps are stored as RFC 3339 TEXT columns
//! and parsed back with chrono.

pub mod folders;
pub mod languages;
pub mod projects;
pub mod segments;
pub mod sessions;
pub mod users;

use chrono::{DateTime, Utc};
use scriba_common::{Error, Result};

/// Parse a required RFC 3339 timestamp column
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Malformed timestamp '{}': {}", value, e)))
}

/// Parse an optional RFC 3339 timestamp column
pub(crate) fn parse_opt_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}
