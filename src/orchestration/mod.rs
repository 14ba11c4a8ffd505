//! # Orchestration
//!
//! The request-scoped services that move a worker through the assignment
//! loop:
//!
//! - **ProjectSelector**: picks the next project from the worker's prioritized
//!   assignments, applying availability, training and gate policy
//! - **TaskClaimer**: reserves and releases individual tasks through the
//!   store's atomic claim primitive
//! - **AnswerSubmissionPipeline**: records an answer and cascades replication,
//!   gold-standard and completion effects
//!
//! Every service holds its store behind an `Arc<dyn ...>` trait object, so the
//! same code runs against [`crate::store::InMemoryStore`] and
//! [`crate::store::PgStore`].

pub mod answer_pipeline;
pub mod project_selector;
pub mod task_claimer;

pub use answer_pipeline::{
    AnswerSubmissionPipeline, SoftWarning, SubmissionResult, SubmitAnswerRequest,
};
pub use project_selector::{ProjectSelector, SelectedProject};
pub use task_claimer::{ClaimOutcome, TaskClaimer};
