//! # Workbench Configuration
//!
//! Layered configuration for the assignment engine. Values come from built-in
//! defaults, then `workbench.toml`, then an optional environment-specific
//! `workbench.<env>.toml`, then `WORKBENCH__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use workbench_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let limit = manager.config().selection.max_candidate_projects;
//! let strict = manager.config().submission.strict_task_completion;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::system;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/workbench.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Database connection settings for the Postgres-backed store
    pub database: DatabaseConfig,

    /// Project routing settings
    pub selection: SelectionConfig,

    /// Answer submission settings
    pub submission: SubmissionConfig,

    /// Worker client log buffering
    pub client_log: ClientLogConfig,

    /// Structured logging output
    pub logging: LoggingConfig,

    /// Submission event channel
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Run embedded migrations when the connection is established
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_seconds: 30,
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    /// Explicit URL, falling back to `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Prioritized assignments considered per selection call
    pub max_candidate_projects: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_candidate_projects: system::DEFAULT_PROJECT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Replications assumed when a question leaves `required_replications` unset
    pub default_required_replications: i32,
    /// Fail the submission when the task completion write fails or touches no rows,
    /// instead of deferring to the store's completion trigger
    pub strict_task_completion: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            default_required_replications: system::DEFAULT_REQUIRED_REPLICATIONS,
            strict_task_completion: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientLogConfig {
    pub buffer_limit: usize,
    pub flush_interval_ms: u64,
}

impl Default for ClientLogConfig {
    fn default() -> Self {
        Self {
            buffer_limit: system::CLIENT_LOG_BUFFER_LIMIT,
            flush_interval_ms: system::CLIENT_LOG_FLUSH_INTERVAL_MS,
        }
    }
}

impl ClientLogConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Explicit filter directive; the environment default is used when unset
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: system::EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl WorkbenchConfig {
    /// Reject values that would make the engine inert or panic at runtime
    pub fn validate(&self) -> ConfigResult<()> {
        if self.selection.max_candidate_projects == 0 {
            return Err(ConfigurationError::invalid_value(
                "selection.max_candidate_projects",
                0,
                "must consider at least one project",
            ));
        }
        if self.submission.default_required_replications < 1 {
            return Err(ConfigurationError::invalid_value(
                "submission.default_required_replications",
                self.submission.default_required_replications,
                "must be at least 1",
            ));
        }
        if self.client_log.buffer_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "client_log.buffer_limit",
                0,
                "buffer must hold at least one entry",
            ));
        }
        if self.client_log.flush_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "client_log.flush_interval_ms",
                0,
                "flush interval must be positive",
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                0,
                "broadcast channels need a positive capacity",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                0,
                "pool needs at least one connection",
            ));
        }
        Ok(())
    }
}
