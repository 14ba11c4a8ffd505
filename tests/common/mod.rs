pub mod builders;
pub mod strategies;

pub use builders::*;

/// Unique, human-readable name for test records
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}
