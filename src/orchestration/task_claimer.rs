//! # Task Claimer
//!
//! Worker-scoped front end for the store's atomic claim primitive.
//!
//! ## Key Features
//!
//! - **Atomic Claiming**: at most one worker holds a task at any time; the
//!   guarantee comes from the [`TaskClaimProtocol`] implementation
//! - **Resumption**: a worker that already holds a reservation in the project
//!   gets the same task back instead of a second one
//! - **Release**: abandoned reservations are returned to the pool
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workbench_core::orchestration::{ClaimOutcome, TaskClaimer};
//! use workbench_core::store::InMemoryStore;
//! use uuid::Uuid;
//!
//! # async fn example(project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let claimer = TaskClaimer::new(Arc::new(InMemoryStore::new()), Uuid::new_v4());
//!
//! if let Some(claimed) = claimer.claim_next_task(project_id).await?.into_claimed() {
//!     println!("Working on row {}", claimed.task.row_index);
//!
//!     // Give the reservation back if the worker walks away
//!     claimer.release_task(claimed.task.task_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{ClaimedTask, TaskClaimProtocol};

/// Result of a claim request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "task", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// A fresh reservation was taken
    Claimed(ClaimedTask),
    /// The worker's existing reservation was handed back
    Resumed(ClaimedTask),
    NoneAvailable,
}

impl ClaimOutcome {
    pub fn claimed_task(&self) -> Option<&ClaimedTask> {
        match self {
            ClaimOutcome::Claimed(task) | ClaimOutcome::Resumed(task) => Some(task),
            ClaimOutcome::NoneAvailable => None,
        }
    }

    pub fn into_claimed(self) -> Option<ClaimedTask> {
        match self {
            ClaimOutcome::Claimed(task) | ClaimOutcome::Resumed(task) => Some(task),
            ClaimOutcome::NoneAvailable => None,
        }
    }

    pub fn is_resumed(&self) -> bool {
        matches!(self, ClaimOutcome::Resumed(_))
    }
}

/// Task claiming component for a single worker
pub struct TaskClaimer {
    protocol: Arc<dyn TaskClaimProtocol>,
    worker_id: Uuid,
}

impl TaskClaimer {
    pub fn new(protocol: Arc<dyn TaskClaimProtocol>, worker_id: Uuid) -> Self {
        Self {
            protocol,
            worker_id,
        }
    }

    /// Reserve the next open task in the project for this worker
    #[instrument(skip(self), fields(worker_id = %self.worker_id))]
    pub async fn claim_next_task(&self, project_id: Uuid) -> Result<ClaimOutcome> {
        debug!("Claiming next task");

        let outcome = match self
            .protocol
            .claim_next_task(project_id, self.worker_id)
            .await?
        {
            Some(claimed) if claimed.was_resumed => ClaimOutcome::Resumed(claimed),
            Some(claimed) => ClaimOutcome::Claimed(claimed),
            None => ClaimOutcome::NoneAvailable,
        };

        match &outcome {
            ClaimOutcome::Claimed(claimed) => info!(
                task_id = %claimed.task.task_id,
                question_id = %claimed.question.question_id,
                row_index = claimed.task.row_index,
                "Claimed task"
            ),
            ClaimOutcome::Resumed(claimed) => info!(
                task_id = %claimed.task.task_id,
                "Resumed existing reservation"
            ),
            ClaimOutcome::NoneAvailable => debug!("No claimable tasks in project"),
        }

        Ok(outcome)
    }

    /// Release a reservation when the worker abandons it
    #[instrument(skip(self), fields(worker_id = %self.worker_id))]
    pub async fn release_task(&self, task_id: Uuid) -> Result<bool> {
        debug!("Releasing task reservation");

        let released = self.protocol.release_task(task_id).await?;

        if released {
            debug!("Task reservation released successfully");
        } else {
            warn!(
                task_id = %task_id,
                "Task reservation was not released (not reserved or already completed)"
            );
        }

        Ok(released)
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, Question};
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_claim_then_resume_then_release() {
        let store = Arc::new(InMemoryStore::new());
        let project = Project::new("Transcription");
        store.insert_project(project.clone());
        store.insert_question(Question::new(project.project_id, "T-1", 0));

        let claimer = TaskClaimer::new(store.clone(), Uuid::new_v4());

        let first = claimer.claim_next_task(project.project_id).await.unwrap();
        assert!(matches!(first, ClaimOutcome::Claimed(_)));

        let second = claimer.claim_next_task(project.project_id).await.unwrap();
        assert!(second.is_resumed());
        assert_eq!(
            first.claimed_task().map(|c| c.task.task_id),
            second.claimed_task().map(|c| c.task.task_id)
        );

        let task_id = second.into_claimed().unwrap().task.task_id;
        assert!(claimer.release_task(task_id).await.unwrap());
        assert!(!claimer.release_task(task_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_project_reports_none_available() {
        let store = Arc::new(InMemoryStore::new());
        let claimer = TaskClaimer::new(store, Uuid::new_v4());
        let outcome = claimer.claim_next_task(Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::NoneAvailable);
        assert!(outcome.claimed_task().is_none());
    }
}
