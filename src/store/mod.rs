//! # Store Interfaces
//!
//! The engine consumes persistence and quality services through these traits.
//! Implementations must provide:
//!
//! - an atomic at-most-one claim per task ([`TaskClaimProtocol`]),
//! - an atomic recount of a question's answers
//!   ([`AssignmentStore::refresh_question_replications`]),
//! - an atomic project counter increment,
//! - read-after-write consistency for the question lookup after an answer insert.
//!
//! [`memory::InMemoryStore`] implements all of them in process;
//! [`postgres::PgStore`] maps them onto SQL functions.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Answer, NewAnswer, Question, ReplicationState, Task, TaskCompletion, TrainingCompletion,
    TrainingGateResult, TrainingModule,
};
use crate::quality::GoldStandardMetrics;

pub use memory::{InMemoryStore, StoreOperation};
pub use postgres::PgStore;

/// Reads and writes the selection and submission flows depend on
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Questions in the project that can still take another reservation
    async fn count_claimable_questions(&self, project_id: Uuid) -> Result<i64>;

    /// Live reservations the worker holds in the project
    async fn count_active_reservations(&self, project_id: Uuid, worker_id: Uuid) -> Result<i64>;

    async fn find_training_module(&self, module_id: Uuid) -> Result<Option<TrainingModule>>;

    async fn find_training_completion(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
        module_id: Uuid,
    ) -> Result<Option<TrainingCompletion>>;

    async fn list_training_gates(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<TrainingGateResult>>;

    async fn find_question_for_row(&self, project_id: Uuid, row_index: i64)
        -> Result<Option<Question>>;

    /// Unique human-readable answer identifier scoped to the question
    async fn generate_answer_identifier(&self, question_identifier: &str) -> Result<String>;

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer>;

    /// Recount persisted answers for the question and write the count and
    /// answered flag back in one atomic step
    async fn refresh_question_replications(
        &self,
        question_id: Uuid,
        default_required: i32,
    ) -> Result<ReplicationState>;

    async fn increment_project_completed_tasks(&self, project_id: Uuid) -> Result<()>;

    /// Mark the task completed with merged data; returns rows affected
    async fn complete_task(&self, completion: TaskCompletion) -> Result<u64>;
}

/// A reservation handed out by the claim primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimedTask {
    pub task: Task,
    pub question: Question,
    /// The worker already held this reservation
    pub was_resumed: bool,
}

/// Atomic reservation of open work items
#[async_trait]
pub trait TaskClaimProtocol: Send + Sync {
    /// Reserve one open task in the project for the worker. A worker that
    /// already holds a reservation in the project gets it back.
    async fn claim_next_task(&self, project_id: Uuid, worker_id: Uuid) -> Result<Option<ClaimedTask>>;

    /// Return a reserved, uncompleted task to the pool
    async fn release_task(&self, task_id: Uuid) -> Result<bool>;
}

/// Trust and accuracy bookkeeping for gold-standard answers
#[async_trait]
pub trait QualityService: Send + Sync {
    async fn refresh_gold_standard_metrics(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<GoldStandardMetrics>;
}
