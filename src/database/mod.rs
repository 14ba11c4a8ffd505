//! # Database Operations
//!
//! Postgres connection pooling and embedded schema migrations for
//! [`crate::store::PgStore`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use workbench_core::config::DatabaseConfig;
//! use workbench_core::database::DatabaseConnection;
//! use workbench_core::store::PgStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! let store = PgStore::new(db.pool().clone()).with_default_required_replications(1);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;
