//! # Project Model
//!
//! Annotation projects and the prioritized worker assignments that route work
//! into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::modality::ModalityConfig;
use crate::constants::ProjectStatus;

/// An annotation project workers can be routed into.
///
/// Training is only enforced when `training_module_id` points at real content;
/// `training_required` alone never blocks routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub training_required: bool,
    pub training_module_id: Option<Uuid>,
    pub requires_training_gate: bool,
    /// Default replications for questions created in this project
    pub replications_per_question: i32,
    /// Number of questions that reached their replication target
    pub completed_tasks: i64,
    pub modality: Option<ModalityConfig>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project_id: Uuid::new_v4(),
            name: name.into(),
            status: ProjectStatus::Active,
            training_required: false,
            training_module_id: None,
            requires_training_gate: false,
            replications_per_question: 1,
            completed_tasks: 0,
            modality: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }
}

/// Join between a worker and a project. Lower `priority` values are served first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub assignment_id: Uuid,
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub priority: i32,
    pub assigned_at: DateTime<Utc>,
}

impl ProjectAssignment {
    pub fn new(worker_id: Uuid, project_id: Uuid, priority: i32) -> Self {
        Self {
            assignment_id: Uuid::new_v4(),
            worker_id,
            project_id,
            priority,
            assigned_at: Utc::now(),
        }
    }
}
