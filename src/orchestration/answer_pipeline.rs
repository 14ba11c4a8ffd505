//! # Answer Submission Pipeline
//!
//! Records one worker's answer for a claimed task and cascades its effects:
//! replication counters, gold-standard scoring, the project completion
//! counter, and the task row itself.
//!
//! Each step commits on its own; there is no rollback across steps. Question
//! lookup through project counter increment are hard failures. The quality
//! refresh and the task completion write degrade to [`SoftWarning`]s because
//! the store's completion trigger is the system of record for task state.
//! Setting `submission.strict_task_completion` makes the task write fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::SubmissionConfig;
use crate::error::{Result, WorkbenchError};
use crate::events::{PublishedEvent, SubmissionEvent, SubmissionEventPublisher};
use crate::logging::{log_error, log_submission_step};
use crate::models::{handle_time_seconds, NewAnswer, Task, TaskCompletion};
use crate::quality::matches_gold_answer;
use crate::store::{AssignmentStore, QualityService};

/// Input for a single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub task: Task,
    pub worker_id: Uuid,
    /// Submitted form fields; must be an object, or null for an empty payload
    pub form_data: Value,
    pub start_time: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

impl SubmitAnswerRequest {
    pub fn new(
        task: Task,
        worker_id: Uuid,
        form_data: Value,
        start_time: DateTime<Utc>,
        completion_time: DateTime<Utc>,
    ) -> Self {
        Self {
            task,
            worker_id,
            form_data,
            start_time,
            completion_time,
            skipped: false,
            skip_reason: None,
        }
    }

    pub fn skipped(mut self, reason: Option<String>) -> Self {
        self.skipped = true;
        self.skip_reason = reason;
        self
    }

    fn form_fields(&self) -> Result<Map<String, Value>> {
        match &self.form_data {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(Map::new()),
            other => Err(WorkbenchError::validation(format!(
                "form data must be a JSON object, got {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-fatal problems collected while a submission completed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoftWarning {
    #[error("gold standard metrics refresh failed: {message}")]
    QualityRefreshFailed { message: String },
    #[error("task completion write failed: {message}")]
    TaskUpdateFailed { message: String },
    #[error("task completion write affected no rows for task {task_id}")]
    TaskUpdateNoRows { task_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub question_id: Uuid,
    pub question_identifier: String,
    pub answer_id: String,
    pub is_fully_answered: bool,
    pub actual_answer_count: i32,
    pub aht_seconds: i64,
    pub trust_rating: Option<f64>,
    pub gold_accuracy: Option<f64>,
    pub gold_match: Option<bool>,
    pub warnings: Vec<SoftWarning>,
}

pub struct AnswerSubmissionPipeline {
    store: Arc<dyn AssignmentStore>,
    quality: Arc<dyn QualityService>,
    config: SubmissionConfig,
    events: SubmissionEventPublisher,
}

impl AnswerSubmissionPipeline {
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        quality: Arc<dyn QualityService>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            store,
            quality,
            config,
            events: SubmissionEventPublisher::default(),
        }
    }

    /// Replace the default event channel, e.g. to size it from configuration
    pub fn with_events(mut self, events: SubmissionEventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PublishedEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    #[instrument(
        skip(self, request),
        fields(task_id = %request.task.task_id, worker_id = %request.worker_id, skipped = request.skipped)
    )]
    pub async fn submit_answer(&self, request: SubmitAnswerRequest) -> Result<SubmissionResult> {
        if request.worker_id.is_nil() {
            return Err(WorkbenchError::validation("worker id is required"));
        }
        let form_fields = request.form_fields()?;
        let task = &request.task;
        let task_id = task.task_id.to_string();

        let aht_seconds = handle_time_seconds(request.start_time, request.completion_time);

        let question = self
            .store
            .find_question_for_row(task.project_id, task.row_index)
            .await?
            .ok_or_else(|| {
                WorkbenchError::not_found(format!(
                    "question for project {} row {}",
                    task.project_id, task.row_index
                ))
            })?;
        let question_id = question.question_id.to_string();
        log_submission_step("question_resolved", Some(question_id.as_str()), Some(task_id.as_str()), "ok", None);

        let answer_id = self
            .store
            .generate_answer_identifier(&question.identifier)
            .await?;

        let answer = self
            .store
            .insert_answer(NewAnswer {
                answer_id,
                question_id: question.question_id,
                project_id: task.project_id,
                worker_id: request.worker_id,
                answer_data: form_fields.clone(),
                start_time: request.start_time,
                completion_time: request.completion_time,
                aht_seconds,
                skipped: request.skipped,
                skip_reason: request.skip_reason.clone(),
            })
            .await?;
        log_submission_step("answer_recorded", Some(question_id.as_str()), Some(task_id.as_str()), "ok", Some(answer.answer_id.as_str()));
        self.events.publish(SubmissionEvent::AnswerRecorded {
            answer_id: answer.answer_id.clone(),
            question_id: question.question_id,
            project_id: task.project_id,
            worker_id: request.worker_id,
            skipped: request.skipped,
        });

        let replication = self
            .store
            .refresh_question_replications(
                question.question_id,
                self.config.default_required_replications,
            )
            .await?;
        debug!(
            completed = replication.completed_replications,
            required = replication.required_replications,
            is_answered = replication.is_answered,
            "Replication count refreshed"
        );

        let mut warnings = Vec::new();
        let mut trust_rating = None;
        let mut gold_accuracy = None;
        let mut gold_match = None;

        if question.is_gold_standard {
            gold_match = matches_gold_answer(
                &Value::Object(form_fields.clone()),
                question.correct_answer.as_ref(),
            );
            if let Some(matched) = gold_match {
                self.events.publish(SubmissionEvent::GoldStandardScored {
                    question_id: question.question_id,
                    worker_id: request.worker_id,
                    matched,
                });
            }

            match self
                .quality
                .refresh_gold_standard_metrics(request.worker_id, task.project_id)
                .await
            {
                Ok(metrics) => {
                    trust_rating = metrics.trust_rating;
                    gold_accuracy = metrics.accuracy;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to refresh gold standard metrics");
                    warnings.push(SoftWarning::QualityRefreshFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        if replication.became_answered() {
            self.store
                .increment_project_completed_tasks(task.project_id)
                .await?;
            log_submission_step("question_completed", Some(question_id.as_str()), Some(task_id.as_str()), "ok", None);
            self.events.publish(SubmissionEvent::QuestionCompleted {
                question_id: question.question_id,
                project_id: task.project_id,
                completed_replications: replication.completed_replications,
            });
        }

        let completion = TaskCompletion {
            task_id: task.task_id,
            completed_at: request.completion_time,
            completion_time_seconds: aht_seconds,
            data: task.merged_completion_data(
                &form_fields,
                request.skipped,
                request.skip_reason.as_deref(),
            ),
        };
        if let Some(warning) = self.complete_task(completion).await? {
            warnings.push(warning);
        }

        info!(
            answer_id = %answer.answer_id,
            actual_answer_count = replication.completed_replications,
            is_fully_answered = replication.is_answered,
            warnings = warnings.len(),
            "Answer submitted"
        );

        Ok(SubmissionResult {
            question_id: question.question_id,
            question_identifier: question.identifier,
            answer_id: answer.answer_id,
            is_fully_answered: replication.is_answered,
            actual_answer_count: replication.completed_replications,
            aht_seconds,
            trust_rating,
            gold_accuracy,
            gold_match,
            warnings,
        })
    }

    /// Write the task completion, returning a warning when the write is
    /// deferred to the store's trigger
    async fn complete_task(&self, completion: TaskCompletion) -> Result<Option<SoftWarning>> {
        let task_id = completion.task_id;
        let task_label = task_id.to_string();

        let warning = match self.store.complete_task(completion).await {
            Ok(0) => SoftWarning::TaskUpdateNoRows { task_id },
            Ok(_) => {
                log_submission_step("task_completed", None, Some(task_label.as_str()), "ok", None);
                return Ok(None);
            }
            Err(e) => {
                log_error(
                    "answer_pipeline",
                    "complete_task",
                    &e.to_string(),
                    Some(task_label.as_str()),
                );
                SoftWarning::TaskUpdateFailed {
                    message: e.to_string(),
                }
            }
        };

        if self.config.strict_task_completion {
            return Err(WorkbenchError::dependency(warning.to_string()));
        }

        warn!(task_id = %task_id, warning = %warning, "Relying on store trigger for task completion");
        self.events.publish(SubmissionEvent::TaskCompletionDeferred {
            task_id,
            reason: warning.to_string(),
        });
        Ok(Some(warning))
    }
}
