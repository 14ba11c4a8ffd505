//! # Database Migrations
//!
//! Schema and SQL functions live under `migrations/` as timestamped files
//! (`YYYYMMDDHHMMSS_description.sql`) and are embedded at compile time.
//! sqlx records applied versions in `_sqlx_migrations` and serializes
//! concurrent runners with an advisory lock.

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply every outstanding migration
    pub async fn run_all(pool: &PgPool) -> Result<()> {
        MIGRATOR.run(pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Database schema is up to date"
        );
        Ok(())
    }

    pub fn migrator() -> &'static Migrator {
        &MIGRATOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_schema_is_embedded() {
        let migrations: Vec<_> = DatabaseMigrations::migrator().iter().collect();
        assert!(!migrations.is_empty());
        assert!(migrations[0].sql.contains("claim_next_available_question"));
        assert!(migrations[0].sql.contains("refresh_question_replications"));
    }
}
