//! Error types for the assignment engine.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkbenchError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failure: {0}")]
    ValidationFailure(String),
    #[error("Dependency failure: {0}")]
    DependencyFailure(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid state: {0}")]
    StateError(String),
}

impl WorkbenchError {
    pub fn not_found(what: impl Into<String>) -> Self {
        WorkbenchError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        WorkbenchError::ValidationFailure(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        WorkbenchError::DependencyFailure(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkbenchError::NotFound(_))
    }

    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, WorkbenchError::DependencyFailure(_))
    }
}

impl From<serde_json::Error> for WorkbenchError {
    fn from(error: serde_json::Error) -> Self {
        WorkbenchError::ValidationFailure(format!("JSON serialization error: {error}"))
    }
}

impl From<sqlx::Error> for WorkbenchError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => WorkbenchError::NotFound("row not found".to_string()),
            other => WorkbenchError::DependencyFailure(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for WorkbenchError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        WorkbenchError::DependencyFailure(format!("Migration failed: {err}"))
    }
}

impl From<crate::config::ConfigurationError> for WorkbenchError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        WorkbenchError::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;
