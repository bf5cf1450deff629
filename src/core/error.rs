/// Driver Error Module
///
/// This module defines the error type shared by every component of the
/// adapter. Native failures are normalized into `ErrorInfo` before they are
/// wrapped here.
use crate::core::db::ErrorInfo;
use thiserror::Error;

/// Comprehensive error type for the adapter.
///
/// Strict (debug) mode surfaces `Statement` and `Database` errors
/// immediately; in the default mode those failures are logged and reported
/// through `Ok(None)` / `Ok(false)` returns instead.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The native client refused to open a session
    #[error("Connection error: {0}")]
    Connection(String),

    /// An operation needed a session but the connection is closed
    #[error("Connection error: no open session")]
    NotConnected,

    /// A raw statement failed while running in strict mode
    #[error("Statement error: {0}")]
    Statement(ErrorInfo),

    /// A prepared statement failed to prepare or execute in strict mode
    #[error("Database error: {0}")]
    Database(ErrorInfo),

    /// Execute was attempted on a statement with no native handle
    #[error("Prepared statement error: you must call prepare before trying to execute a prepared statement")]
    PreparedStatementPrecondition,

    /// Parameter binding errors (slot out of range)
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// A catalog introspection query itself failed
    #[error("Schema error: {0}")]
    SchemaQuery(String),

    /// Transaction ordering errors
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Backup preferences could not produce a statement
    #[error("Backup error: {0}")]
    Backup(String),

    /// A dialect template referenced an unknown placeholder
    #[error("Dialect error: {0}")]
    Dialect(String),

    /// The dialect does not provide the requested operation
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Type alias for Result to use DriverError as the error type.
pub type Result<T> = std::result::Result<T, DriverError>;
