//! # In-Memory Store
//!
//! Process-local implementation of every store interface. Reservation and
//! recount atomicity come from locks held across the read and the write, the
//! same guarantees the SQL functions provide with row locks.
//!
//! Inserting an answer also completes the worker's reservation for that
//! question, standing in for the database trigger that backs up the
//! pipeline's own task completion write.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AssignmentStore, ClaimedTask, QualityService, TaskClaimProtocol};
use crate::constants::{system, TaskStatus};
use crate::error::{Result, WorkbenchError};
use crate::models::{
    Answer, NewAnswer, Project, Question, ReplicationState, Task, TaskCompletion,
    TrainingCompletion, TrainingGateResult, TrainingModule,
};
use crate::quality::{matches_gold_answer, GoldStandardMetrics};

/// Store calls that can be made to fail in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CountClaimable,
    CountReservations,
    FindTrainingModule,
    FindTrainingCompletion,
    ListTrainingGates,
    FindQuestion,
    GenerateAnswerId,
    InsertAnswer,
    RefreshReplications,
    IncrementProject,
    CompleteTask,
    ClaimTask,
    ReleaseTask,
    RefreshGoldMetrics,
}

#[derive(Debug)]
pub struct InMemoryStore {
    projects: DashMap<Uuid, Project>,
    questions: DashMap<Uuid, Question>,
    tasks: DashMap<Uuid, Task>,
    answers: RwLock<Vec<Answer>>,
    training_modules: DashMap<Uuid, TrainingModule>,
    training_completions: RwLock<Vec<TrainingCompletion>>,
    training_gates: RwLock<Vec<TrainingGateResult>>,
    answer_sequences: DashMap<String, u64>,
    claim_lock: Mutex<()>,
    failures: Mutex<HashSet<StoreOperation>>,
    complete_on_answer: AtomicBool,
    default_required_replications: i32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            projects: DashMap::new(),
            questions: DashMap::new(),
            tasks: DashMap::new(),
            answers: RwLock::new(Vec::new()),
            training_modules: DashMap::new(),
            training_completions: RwLock::new(Vec::new()),
            training_gates: RwLock::new(Vec::new()),
            answer_sequences: DashMap::new(),
            claim_lock: Mutex::new(()),
            failures: Mutex::new(HashSet::new()),
            complete_on_answer: AtomicBool::new(true),
            default_required_replications: system::DEFAULT_REQUIRED_REPLICATIONS,
        }
    }

    /// Replications assumed for questions that leave them unset. Must match
    /// `submission.default_required_replications` of the pipeline using this store.
    pub fn with_default_required_replications(mut self, required: i32) -> Self {
        self.default_required_replications = required.max(1);
        self
    }

    pub fn insert_project(&self, project: Project) {
        self.projects.insert(project.project_id, project);
    }

    /// Insert a question with one pending task per required replication
    pub fn insert_question(&self, question: Question) -> Vec<Task> {
        let slots = question.required_replications_or(self.default_required_replications);

        let tasks: Vec<Task> = (0..slots)
            .map(|_| Task::new(question.project_id, question.question_id, question.row_index))
            .collect();
        for task in &tasks {
            self.tasks.insert(task.task_id, task.clone());
        }
        self.questions.insert(question.question_id, question);
        tasks
    }

    pub fn insert_task(&self, task: Task) {
        self.tasks.insert(task.task_id, task);
    }

    pub fn insert_training_module(&self, module: TrainingModule) {
        self.training_modules.insert(module.module_id, module);
    }

    pub fn record_training_completion(&self, completion: TrainingCompletion) {
        self.training_completions.write().push(completion);
    }

    pub fn record_gate_result(&self, gate: TrainingGateResult) {
        self.training_gates.write().push(gate);
    }

    pub fn project(&self, project_id: Uuid) -> Option<Project> {
        self.projects.get(&project_id).map(|entry| entry.clone())
    }

    pub fn question(&self, question_id: Uuid) -> Option<Question> {
        self.questions.get(&question_id).map(|entry| entry.clone())
    }

    pub fn task(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.get(&task_id).map(|entry| entry.clone())
    }

    pub fn answers_for_question(&self, question_id: Uuid) -> Vec<Answer> {
        self.answers
            .read()
            .iter()
            .filter(|answer| answer.question_id == question_id)
            .cloned()
            .collect()
    }

    /// Make every subsequent call of `operation` fail with a dependency error
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failures.lock().insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Toggle the emulated completion trigger on answer insert
    pub fn set_completion_trigger(&self, enabled: bool) {
        self.complete_on_answer.store(enabled, Ordering::SeqCst);
    }

    fn check(&self, operation: StoreOperation) -> Result<()> {
        if self.failures.lock().contains(&operation) {
            return Err(WorkbenchError::dependency(format!(
                "injected failure for {operation:?}"
            )));
        }
        Ok(())
    }

    /// Live reservations per question in the project
    fn reserved_counts(&self, project_id: Uuid) -> HashMap<Uuid, i32> {
        let mut counts = HashMap::new();
        for task in self.tasks.iter() {
            if task.project_id == project_id && task.status.is_reserved() {
                if let Some(question_id) = task.question_id {
                    *counts.entry(question_id).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    fn question_has_capacity(&self, question: &Question, reserved: i32) -> bool {
        !question.is_answered
            && question.completed_replications + reserved
                < question.required_replications_or(self.default_required_replications)
    }

    /// Pending, unassigned tasks whose question can take another replication
    fn claimable_tasks(&self, project_id: Uuid) -> Vec<Task> {
        let reserved = self.reserved_counts(project_id);
        let mut candidates: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| {
                task.project_id == project_id
                    && task.status == TaskStatus::Pending
                    && task.assigned_to.is_none()
            })
            .map(|task| task.clone())
            .collect();

        candidates.retain(|task| {
            task.question_id
                .and_then(|question_id| self.question(question_id))
                .is_some_and(|question| {
                    let held = reserved.get(&question.question_id).copied().unwrap_or(0);
                    self.question_has_capacity(&question, held)
                })
        });
        candidates.sort_by_key(|task| (task.row_index, task.task_id));
        candidates
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn count_claimable_questions(&self, project_id: Uuid) -> Result<i64> {
        self.check(StoreOperation::CountClaimable)?;
        let questions: HashSet<Uuid> = self
            .claimable_tasks(project_id)
            .into_iter()
            .filter_map(|task| task.question_id)
            .collect();
        Ok(questions.len() as i64)
    }

    async fn count_active_reservations(&self, project_id: Uuid, worker_id: Uuid) -> Result<i64> {
        self.check(StoreOperation::CountReservations)?;
        Ok(self
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id && task.is_reserved_by(worker_id))
            .count() as i64)
    }

    async fn find_training_module(&self, module_id: Uuid) -> Result<Option<TrainingModule>> {
        self.check(StoreOperation::FindTrainingModule)?;
        Ok(self.training_modules.get(&module_id).map(|entry| entry.clone()))
    }

    async fn find_training_completion(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
        module_id: Uuid,
    ) -> Result<Option<TrainingCompletion>> {
        self.check(StoreOperation::FindTrainingCompletion)?;
        Ok(self
            .training_completions
            .read()
            .iter()
            .find(|completion| {
                completion.worker_id == worker_id
                    && completion.project_id == project_id
                    && completion.training_module_id == module_id
            })
            .cloned())
    }

    async fn list_training_gates(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<TrainingGateResult>> {
        self.check(StoreOperation::ListTrainingGates)?;
        Ok(self
            .training_gates
            .read()
            .iter()
            .filter(|gate| gate.worker_id == worker_id && gate.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_question_for_row(
        &self,
        project_id: Uuid,
        row_index: i64,
    ) -> Result<Option<Question>> {
        self.check(StoreOperation::FindQuestion)?;
        Ok(self
            .questions
            .iter()
            .find(|question| question.project_id == project_id && question.row_index == row_index)
            .map(|question| question.clone()))
    }

    async fn generate_answer_identifier(&self, question_identifier: &str) -> Result<String> {
        self.check(StoreOperation::GenerateAnswerId)?;
        let mut sequence = self
            .answer_sequences
            .entry(question_identifier.to_string())
            .or_insert(0);
        *sequence += 1;
        Ok(format!("{question_identifier}-A{:03}", *sequence))
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer> {
        self.check(StoreOperation::InsertAnswer)?;
        let answer = answer.into_answer(Uuid::new_v4());

        let mut answers = self.answers.write();
        if answers.iter().any(|existing| existing.answer_id == answer.answer_id) {
            return Err(WorkbenchError::validation(format!(
                "duplicate answer identifier {}",
                answer.answer_id
            )));
        }
        answers.push(answer.clone());

        if self.complete_on_answer.load(Ordering::SeqCst) {
            let reserved: Vec<Uuid> = self
                .tasks
                .iter()
                .filter(|task| {
                    task.question_id == Some(answer.question_id)
                        && task.is_reserved_by(answer.worker_id)
                })
                .map(|task| task.task_id)
                .collect();
            for task_id in reserved {
                if let Some(mut task) = self.tasks.get_mut(&task_id) {
                    task.status = TaskStatus::Completed;
                    task.completed_at = Some(answer.completion_time);
                    task.completion_time_seconds = Some(answer.aht_seconds);
                    debug!(task_id = %task_id, "Completion trigger closed reservation");
                }
            }
        }

        Ok(answer)
    }

    async fn refresh_question_replications(
        &self,
        question_id: Uuid,
        default_required: i32,
    ) -> Result<ReplicationState> {
        self.check(StoreOperation::RefreshReplications)?;

        // Holding the write lock orders this recount after every insert it can see
        let answers = self.answers.write();
        let answer_count = answers
            .iter()
            .filter(|answer| answer.question_id == question_id)
            .count() as i32;

        let mut question = self
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| WorkbenchError::not_found(format!("question {question_id}")))?;
        let was_answered = question.is_answered;
        question.apply_answer_count(answer_count, default_required);

        Ok(ReplicationState {
            completed_replications: question.completed_replications,
            required_replications: question.required_replications_or(default_required),
            is_answered: question.is_answered,
            was_answered,
        })
    }

    async fn increment_project_completed_tasks(&self, project_id: Uuid) -> Result<()> {
        self.check(StoreOperation::IncrementProject)?;
        let mut project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| WorkbenchError::not_found(format!("project {project_id}")))?;
        project.completed_tasks += 1;
        Ok(())
    }

    async fn complete_task(&self, completion: TaskCompletion) -> Result<u64> {
        self.check(StoreOperation::CompleteTask)?;
        match self.tasks.get_mut(&completion.task_id) {
            Some(mut task) => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(completion.completed_at);
                task.completion_time_seconds = Some(completion.completion_time_seconds);
                task.data = completion.data;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl TaskClaimProtocol for InMemoryStore {
    async fn claim_next_task(&self, project_id: Uuid, worker_id: Uuid) -> Result<Option<ClaimedTask>> {
        self.check(StoreOperation::ClaimTask)?;
        let _guard = self.claim_lock.lock();

        let held = self
            .tasks
            .iter()
            .find(|task| task.project_id == project_id && task.is_reserved_by(worker_id))
            .map(|task| task.clone());
        if let Some(task) = held {
            let question = task
                .question_id
                .and_then(|question_id| self.question(question_id))
                .ok_or_else(|| WorkbenchError::not_found(format!("question for task {}", task.task_id)))?;
            return Ok(Some(ClaimedTask {
                task,
                question,
                was_resumed: true,
            }));
        }

        let answered_by_worker: HashSet<Uuid> = self
            .answers
            .read()
            .iter()
            .filter(|answer| answer.worker_id == worker_id && answer.project_id == project_id)
            .map(|answer| answer.question_id)
            .collect();

        let next = self.claimable_tasks(project_id).into_iter().find(|task| {
            task.question_id
                .is_some_and(|question_id| !answered_by_worker.contains(&question_id))
        });
        let Some(candidate) = next else {
            return Ok(None);
        };

        let task = {
            let mut entry = self
                .tasks
                .get_mut(&candidate.task_id)
                .ok_or_else(|| WorkbenchError::not_found(format!("task {}", candidate.task_id)))?;
            entry.status = TaskStatus::Assigned;
            entry.assigned_to = Some(worker_id);
            entry.assigned_at = Some(Utc::now());
            entry.clone()
        };
        let question = task
            .question_id
            .and_then(|question_id| self.question(question_id))
            .ok_or_else(|| WorkbenchError::not_found(format!("question for task {}", task.task_id)))?;

        Ok(Some(ClaimedTask {
            task,
            question,
            was_resumed: false,
        }))
    }

    async fn release_task(&self, task_id: Uuid) -> Result<bool> {
        self.check(StoreOperation::ReleaseTask)?;
        let _guard = self.claim_lock.lock();

        let Some(mut task) = self.tasks.get_mut(&task_id) else {
            return Ok(false);
        };
        if !task.status.is_reserved() {
            return Ok(false);
        }
        task.status = TaskStatus::Pending;
        task.assigned_to = None;
        task.assigned_at = None;
        Ok(true)
    }
}

#[async_trait]
impl QualityService for InMemoryStore {
    /// Accuracy is the share of the worker's gold answers in the project that
    /// match; trust rating is that share in percent.
    async fn refresh_gold_standard_metrics(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<GoldStandardMetrics> {
        self.check(StoreOperation::RefreshGoldMetrics)?;

        let answers: Vec<Answer> = self
            .answers
            .read()
            .iter()
            .filter(|answer| answer.worker_id == worker_id && answer.project_id == project_id)
            .cloned()
            .collect();

        let mut scored = 0usize;
        let mut matched = 0usize;
        for answer in answers.iter().filter(|answer| !answer.skipped) {
            let Some(question) = self.question(answer.question_id) else {
                warn!(question_id = %answer.question_id, "Answer references a missing question");
                continue;
            };
            if !question.is_gold_standard {
                continue;
            }
            let submitted = Value::Object(answer.answer_data.clone());
            if let Some(is_match) = matches_gold_answer(&submitted, question.correct_answer.as_ref()) {
                scored += 1;
                if is_match {
                    matched += 1;
                }
            }
        }

        if scored == 0 {
            return Ok(GoldStandardMetrics::default());
        }
        let accuracy = matched as f64 / scored as f64;
        Ok(GoldStandardMetrics {
            accuracy: Some(accuracy),
            trust_rating: Some((accuracy * 10_000.0).round() / 100.0),
        })
    }
}
