//! # Project Selector
//!
//! Routes a worker into the next project with claimable work, walking the
//! worker's assignments in priority order.
//!
//! ## Lookup failure policy
//!
//! - Availability lookup failure: the project is skipped.
//! - Reservation lookup failure: the worker is treated as holding none.
//! - Training lookup failure (module or completion): training is not required
//!   for this evaluation. A configured module id that resolves to no module
//!   row is treated the same way.
//! - Gate lookup failure: gates are reported as not passed, which blocks the
//!   project. An empty gate set also blocks.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workbench_core::config::SelectionConfig;
//! use workbench_core::orchestration::ProjectSelector;
//! use workbench_core::store::InMemoryStore;
//! use uuid::Uuid;
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryStore::new());
//! let selector = ProjectSelector::new(store, SelectionConfig::default());
//!
//! let selected = selector.select_next_project(Uuid::new_v4(), &[], &[]).await;
//! assert!(selected.is_none());
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::SelectionConfig;
use crate::constants::SelectionReason;
use crate::logging::log_selection_decision;
use crate::models::{gates_passed, Project, ProjectAssignment, TrainingModule};
use crate::store::AssignmentStore;

/// The project a worker should be routed into next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProject {
    pub project: Project,
    pub available_count: i64,
    pub has_active_reservation: bool,
    pub training_module: Option<TrainingModule>,
    pub training_completion_id: Option<Uuid>,
    pub training_required: bool,
    pub training_completed: bool,
    pub gate_required: bool,
    pub gates_passed: bool,
    pub reason: SelectionReason,
}

#[derive(Debug, Clone, PartialEq)]
struct TrainingState {
    module: Option<TrainingModule>,
    completion_id: Option<Uuid>,
    required: bool,
    completed: bool,
}

impl TrainingState {
    fn not_required(module: Option<TrainingModule>) -> Self {
        Self {
            module,
            completion_id: None,
            required: false,
            completed: true,
        }
    }
}

pub struct ProjectSelector {
    store: Arc<dyn AssignmentStore>,
    config: SelectionConfig,
}

impl ProjectSelector {
    pub fn new(store: Arc<dyn AssignmentStore>, config: SelectionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Pick the first assignment, by ascending priority, whose project is
    /// active, has claimable work or a reservation held by the worker, and
    /// whose gates are passed. Returns `None` when nothing qualifies.
    #[instrument(skip(self, assignments, projects), fields(assignments = assignments.len()))]
    pub async fn select_next_project(
        &self,
        worker_id: Uuid,
        assignments: &[ProjectAssignment],
        projects: &[Project],
    ) -> Option<SelectedProject> {
        let worker = worker_id.to_string();

        if assignments.is_empty() || projects.is_empty() {
            log_selection_decision(&worker, None, "no_candidates", None);
            return None;
        }

        let mut prioritized: Vec<&ProjectAssignment> = assignments.iter().collect();
        prioritized.sort_by_key(|assignment| assignment.priority);
        prioritized.truncate(self.config.max_candidate_projects);

        for assignment in prioritized {
            let Some(project) = projects
                .iter()
                .find(|project| project.project_id == assignment.project_id)
            else {
                debug!(project_id = %assignment.project_id, "Assignment references an unknown project");
                continue;
            };

            if !project.is_active() {
                debug!(project_id = %project.project_id, status = %project.status, "Skipping inactive project");
                continue;
            }

            if let Some(selected) = self.evaluate_candidate(worker_id, project).await {
                let project_id = selected.project.project_id.to_string();
                log_selection_decision(
                    &worker,
                    Some(project_id.as_str()),
                    selected.reason.as_str(),
                    Some(format!("available={}", selected.available_count).as_str()),
                );
                return Some(selected);
            }
        }

        log_selection_decision(&worker, None, "no_eligible_project", None);
        None
    }

    async fn evaluate_candidate(&self, worker_id: Uuid, project: &Project) -> Option<SelectedProject> {
        let available_count = match self.store.count_claimable_questions(project.project_id).await {
            Ok(count) => count.max(0),
            Err(e) => {
                warn!(project_id = %project.project_id, error = %e, "Failed to load availability, skipping project");
                return None;
            }
        };

        let has_active_reservation = if available_count == 0 {
            match self
                .store
                .count_active_reservations(project.project_id, worker_id)
                .await
            {
                Ok(count) => count > 0,
                Err(e) => {
                    warn!(project_id = %project.project_id, error = %e, "Failed to count reservations");
                    false
                }
            }
        } else {
            false
        };

        // Nothing to claim or resume: move on whatever the training state is
        if available_count == 0 && !has_active_reservation {
            debug!(project_id = %project.project_id, "No claimable work");
            return None;
        }

        let (training, gates_passed) = tokio::join!(
            self.resolve_training(worker_id, project),
            self.resolve_gates(worker_id, project)
        );

        if !gates_passed {
            debug!(project_id = %project.project_id, "Training gates not passed");
            return None;
        }

        let gate_required = project.requires_training_gate;
        let reason = if (training.required && !training.completed) || (gate_required && !gates_passed) {
            SelectionReason::TrainingRequired
        } else {
            SelectionReason::Available
        };

        Some(SelectedProject {
            project: project.clone(),
            available_count,
            has_active_reservation,
            training_module: training.module,
            training_completion_id: training.completion_id,
            training_required: training.required,
            training_completed: training.completed,
            gate_required,
            gates_passed,
            reason,
        })
    }

    async fn resolve_training(&self, worker_id: Uuid, project: &Project) -> TrainingState {
        let Some(module_id) = project.training_module_id else {
            return TrainingState::not_required(None);
        };

        let module = match self.store.find_training_module(module_id).await {
            Ok(Some(module)) => module,
            Ok(None) => {
                debug!(module_id = %module_id, "Training module missing, not gating on it");
                return TrainingState::not_required(None);
            }
            Err(e) => {
                warn!(module_id = %module_id, error = %e, "Failed to load training module");
                return TrainingState::not_required(None);
            }
        };

        if !project.training_required {
            return TrainingState::not_required(Some(module));
        }

        match self
            .store
            .find_training_completion(worker_id, project.project_id, module.module_id)
            .await
        {
            Ok(Some(completion)) => TrainingState {
                module: Some(module),
                completion_id: Some(completion.completion_id),
                required: true,
                completed: true,
            },
            Ok(None) => TrainingState {
                module: Some(module),
                completion_id: None,
                required: true,
                completed: false,
            },
            Err(e) => {
                warn!(module_id = %module_id, error = %e, "Failed to verify training completion");
                TrainingState::not_required(Some(module))
            }
        }
    }

    async fn resolve_gates(&self, worker_id: Uuid, project: &Project) -> bool {
        if !project.requires_training_gate {
            return true;
        }

        match self
            .store
            .list_training_gates(worker_id, project.project_id)
            .await
        {
            Ok(gates) => gates_passed(&gates),
            Err(e) => {
                warn!(project_id = %project.project_id, error = %e, "Failed to load training gates");
                false
            }
        }
    }
}
