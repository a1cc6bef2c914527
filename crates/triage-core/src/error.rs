//! Core error types for triage-core.
//!
//! Task operations fail on a referenced record that does not exist, on
//! storage trouble, or on rejected input such as a blank title. Slider
//! parsing and collaborator failures are recovered where they happen.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for triage-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Referenced task, subtask or user does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Uniqueness violation (e.g. a username already taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Collaborator errors that were not absorbed by a fallback
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn task_not_found(id: i64) -> Self {
        CoreError::NotFound { entity: "task", id }
    }

    pub fn subtask_not_found(id: i64) -> Self {
        CoreError::NotFound { entity: "subtask", id }
    }

    pub fn user_not_found(id: i64) -> Self {
        CoreError::NotFound { entity: "user", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be decoded (column index within the row)
    #[error("Corrupt value in column {column}: {message}")]
    CorruptValue { column: usize, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The connection mutex was poisoned by a panicking holder
    #[error("Database handle poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No usable data directory
    #[error("Cannot determine data directory")]
    NoDataDir,
}

/// Failures of the external breakdown generator or urgency estimator.
///
/// These are logged and replaced by fallback values at the collaborator
/// boundary; they only surface when a caller uses a raw collaborator.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// Transport failure
    #[error("HTTP request to {service} failed: {message}")]
    Http { service: &'static str, message: String },

    /// The service answered but the payload could not be used
    #[error("Malformed response from {service}: {message}")]
    Malformed { service: &'static str, message: String },

    /// API key not present in the environment
    #[error("API key for {service} not configured (expected in ${env_var})")]
    MissingApiKey { service: &'static str, env_var: String },

    /// Collaborator disabled by configuration
    #[error("{0} is disabled")]
    Disabled(&'static str),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty value where text is required
    #[error("'{0}' must not be empty")]
    Empty(&'static str),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => DatabaseError::CorruptValue {
                column: *column,
                message: source.to_string(),
            },
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
