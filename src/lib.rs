#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Workbench Core
//!
//! Task assignment and quality-control engine for crowd annotation work.
//!
//! ## Overview
//!
//! Workers are routed into annotation projects, claim individual rows, submit
//! answers, and progress through difficulty tiers. This crate holds the rules
//! with real invariants:
//!
//! - which project a worker should work on next, including training and gate
//!   policy
//! - how a submitted answer moves replication counts, gold-standard accuracy,
//!   trust and project completion
//! - how difficulty tiers unlock from historical performance
//! - whether a terminated worker may be rehired
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Project selection, task claiming and answer submission
//! - [`eligibility`] - Difficulty unlock and rehire policy (pure functions)
//! - [`quality`] - Gold-standard scoring and worker quality aggregation
//! - [`store`] - Store interfaces plus in-memory and Postgres implementations
//! - [`models`] - Projects, questions, tasks, answers, training records, workers
//! - [`events`] - Typed submission events over a scoped broadcast channel
//! - [`client_log`] - Bounded worker-side log buffer with batched flushing
//! - [`config`] - Layered configuration management
//! - [`database`] - Postgres pool and embedded migrations
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workbench_core::config::WorkbenchConfig;
//! use workbench_core::events::SubmissionEventPublisher;
//! use workbench_core::orchestration::{AnswerSubmissionPipeline, ProjectSelector};
//! use workbench_core::store::InMemoryStore;
//!
//! # fn main() {
//! let config = WorkbenchConfig::default();
//! let store = Arc::new(
//!     InMemoryStore::new()
//!         .with_default_required_replications(config.submission.default_required_replications),
//! );
//!
//! let selector = ProjectSelector::new(store.clone(), config.selection.clone());
//! let pipeline = AnswerSubmissionPipeline::new(store.clone(), store, config.submission.clone())
//!     .with_events(SubmissionEventPublisher::from_config(&config.events));
//! # }
//! ```
//!
//! ## Testing
//!
//! Integration tests run against [`store::InMemoryStore`] and need no database:
//!
//! ```bash
//! cargo test
//! ```

pub mod client_log;
pub mod config;
pub mod constants;
pub mod database;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod quality;
pub mod store;

pub use config::{ConfigManager, WorkbenchConfig};
pub use constants::{GateStatus, ProjectStatus, SelectionReason, TaskStatus, WorkerStatus};
pub use eligibility::{
    evaluate_difficulty_criteria, evaluate_rehire_eligibility, get_unlocked_difficulties,
    DifficultyLevel, RehireEligibilityInput, RehireEligibilityResult, UnlockMetrics,
};
pub use error::{Result, WorkbenchError};
pub use orchestration::{
    AnswerSubmissionPipeline, ProjectSelector, SelectedProject, SubmissionResult,
    SubmitAnswerRequest, TaskClaimer,
};
pub use quality::matches_gold_answer;
pub use store::{AssignmentStore, InMemoryStore, PgStore, QualityService, TaskClaimProtocol};
