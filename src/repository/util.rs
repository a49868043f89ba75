//! Repository utilities.

use chrono::{DateTime, Utc};
use diesel::result::DatabaseErrorInformation;

use super::store::StoreError;

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
///
/// Used inside transactions, whose error type must be a diesel error.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Whether a database URL selects the ephemeral in-memory store.
pub fn is_memory_url(url: &str) -> bool {
    url == "memory:" || url == "memory"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_falls_back_to_epoch() {
        assert_eq!(parse_datetime("not a date"), DateTime::UNIX_EPOCH);
        assert_eq!(
            parse_datetime("2024-03-01T12:00:00Z").to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_diesel_errors_map_to_database_errors() {
        let err = StoreError::from(diesel::result::Error::NotFound);
        assert!(matches!(err, StoreError::Database(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_memory_url_detection() {
        assert!(is_memory_url("memory:"));
        assert!(is_memory_url("memory"));
        assert!(!is_memory_url("sqlite:memory.db"));
        assert!(!is_memory_url("/tmp/prospects.db"));
    }
}
