//! Error types for review-storage

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Row store errors (SQLite)
    Database,
    /// Unique constraint violated on write
    Conflict,
    /// Key-value cache backend errors
    Cache,
    /// Search/document store errors
    Search,
    /// Serialization/deserialization errors
    Serialization,
    /// String-encoded field did not decode (view type boundary)
    Decode,
    /// Transaction errors
    Transaction,
    /// Configuration errors
    Config,
    /// I/O errors
    IO,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Cache => "cache",
            ErrorKind::Search => "search",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Decode => "decode",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Config => "config",
            ErrorKind::IO => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
///
/// The source is reference counted so the error can be cloned and handed to
/// every waiter of a shared fetch.
#[derive(Debug, Clone, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Search, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn decode(field: &str, value: &str) -> Self {
        Self::new(
            ErrorKind::Decode,
            format!("field '{}' has undecodable value '{}'", field, value),
        )
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        // Only key uniqueness is a conflict; NOT NULL, CHECK and trigger
        // aborts are backend failures
        let constraint = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        );
        if constraint {
            StorageError::conflict(format!("SQLite constraint: {}", err)).with_source(err)
        } else {
            StorageError::database(format!("SQLite error: {}", err)).with_source(err)
        }
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::new(ErrorKind::IO, format!("I/O error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_database_error() {
        let err = StorageError::database("Connection failed");
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Connection failed");
        assert!(err.source.is_none());
        assert_eq!(format!("{}", err), "[database] Connection failed");
    }

    #[test]
    fn test_decode_error_names_field() {
        let err = StorageError::decode("store_id", "12x");
        assert_eq!(err.kind, ErrorKind::Decode);
        let msg = err.to_string();
        assert!(msg.contains("[decode]"));
        assert!(msg.contains("store_id"));
        assert!(msg.contains("12x"));
    }

    #[test]
    fn test_with_source_survives_clone() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "redis down");
        let err = StorageError::cache("GET failed").with_source(io_err);
        let cloned = err.clone();

        assert_eq!(cloned.kind, ErrorKind::Cache);
        let source = cloned.source().unwrap();
        assert!(source.to_string().contains("redis down"));
    }

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Database.as_str(), "database");
        assert_eq!(ErrorKind::Conflict.as_str(), "conflict");
        assert_eq!(ErrorKind::Cache.as_str(), "cache");
        assert_eq!(ErrorKind::Search.as_str(), "search");
        assert_eq!(ErrorKind::Serialization.as_str(), "serialization");
        assert_eq!(ErrorKind::Decode.as_str(), "decode");
        assert_eq!(ErrorKind::Transaction.as_str(), "transaction");
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::IO.as_str(), "io");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_error() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k INTEGER UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();
        let err: StorageError = conn
            .execute("INSERT INTO t VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(err.is_conflict());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_other_constraints_are_database_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (k INTEGER NOT NULL, v INTEGER CHECK (v > 0));
             CREATE TABLE guarded (k INTEGER);
             CREATE TRIGGER refuse BEFORE INSERT ON guarded
             BEGIN SELECT RAISE(ABORT, 'disk policy'); END;",
        )
        .unwrap();

        for sql in [
            "INSERT INTO t (k, v) VALUES (NULL, 1)",
            "INSERT INTO t (k, v) VALUES (1, 0)",
            "INSERT INTO guarded (k) VALUES (1)",
        ] {
            let err: StorageError = conn.execute(sql, []).unwrap_err().into();
            assert!(!err.is_conflict(), "{} mapped to conflict", sql);
            assert_eq!(err.kind, ErrorKind::Database);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json")
            .err()
            .unwrap();
        let err: StorageError = json_err.into();

        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(err.message.contains("JSON error"));
        assert!(err.source.is_some());
    }
}
