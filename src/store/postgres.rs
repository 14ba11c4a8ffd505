//! # Postgres Store
//!
//! Maps the store interfaces onto the SQL functions installed by
//! `migrations/`. Claims, recounts and counter increments each run inside a
//! single function call so row locks give the atomicity guarantees.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{AssignmentStore, ClaimedTask, QualityService, TaskClaimProtocol};
use crate::constants::{system, GateStatus, TaskStatus};
use crate::error::{Result, WorkbenchError};
use crate::models::{
    Answer, NewAnswer, Question, ReplicationState, Task, TaskCompletion, TrainingCompletion,
    TrainingGateResult, TrainingModule,
};
use crate::quality::GoldStandardMetrics;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    default_required_replications: i32,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            default_required_replications: system::DEFAULT_REQUIRED_REPLICATIONS,
        }
    }

    /// Replications assumed for questions that leave them unset when sizing
    /// claim capacity. Must match `submission.default_required_replications`.
    pub fn with_default_required_replications(mut self, required: i32) -> Self {
        self.default_required_replications = required.max(1);
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_task(&self, task_id: Uuid) -> Result<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT task_id, project_id, question_id, row_index, data, status,
                   assigned_to, assigned_at, completed_at, completion_time_seconds
            FROM tasks WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load task", e))?
        .ok_or_else(|| WorkbenchError::not_found(format!("task {task_id}")))?;

        row.try_into()
    }

    async fn load_question(&self, question_id: Uuid) -> Result<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, identifier, project_id, row_index, data,
                   required_replications, completed_replications, is_answered,
                   is_gold_standard, correct_answer
            FROM questions WHERE question_id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("load question", e))?
        .ok_or_else(|| WorkbenchError::not_found(format!("question {question_id}")))?;

        Ok(row.into())
    }
}

fn db_error(operation: &str, e: sqlx::Error) -> WorkbenchError {
    if matches!(e, sqlx::Error::RowNotFound) {
        return WorkbenchError::not_found(operation.to_string());
    }
    error!("Failed to {}: {}", operation, e);
    WorkbenchError::dependency(format!("{operation} failed: {e}"))
}

fn object_or_empty(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn count_claimable_questions(&self, project_id: Uuid) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT count_claimable_questions($1::UUID, $2::INTEGER) AS available")
                .bind(project_id)
                .bind(self.default_required_replications)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("count claimable questions", e))?;
        Ok(row.0)
    }

    async fn count_active_reservations(&self, project_id: Uuid, worker_id: Uuid) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT count_active_reservations_for_worker($1::UUID, $2::UUID) AS reserved",
        )
        .bind(project_id)
        .bind(worker_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("count active reservations", e))?;
        Ok(row.0)
    }

    async fn find_training_module(&self, module_id: Uuid) -> Result<Option<TrainingModule>> {
        let row = sqlx::query_as::<_, TrainingModuleRow>(
            "SELECT module_id, title, content_url FROM training_modules WHERE module_id = $1",
        )
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find training module", e))?;

        Ok(row.map(|row| TrainingModule {
            module_id: row.module_id,
            title: row.title,
            content_url: row.content_url,
        }))
    }

    async fn find_training_completion(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
        module_id: Uuid,
    ) -> Result<Option<TrainingCompletion>> {
        let row = sqlx::query_as::<_, TrainingCompletionRow>(
            r#"
            SELECT completion_id, worker_id, project_id, training_module_id, completed_at
            FROM worker_training_completions
            WHERE worker_id = $1 AND project_id = $2 AND training_module_id = $3
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(worker_id)
        .bind(project_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find training completion", e))?;

        Ok(row.map(|row| TrainingCompletion {
            completion_id: row.completion_id,
            worker_id: row.worker_id,
            project_id: row.project_id,
            training_module_id: row.training_module_id,
            completed_at: row.completed_at,
        }))
    }

    async fn list_training_gates(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<TrainingGateResult>> {
        let rows = sqlx::query_as::<_, TrainingGateRow>(
            r#"
            SELECT gate_id, worker_id, project_id, gate_name, status, checked_at
            FROM worker_training_gates
            WHERE worker_id = $1 AND project_id = $2
            "#,
        )
        .bind(worker_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list training gates", e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_question_for_row(
        &self,
        project_id: Uuid,
        row_index: i64,
    ) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question_id, identifier, project_id, row_index, data,
                   required_replications, completed_replications, is_answered,
                   is_gold_standard, correct_answer
            FROM questions WHERE project_id = $1 AND row_index = $2
            "#,
        )
        .bind(project_id)
        .bind(row_index)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find question for row", e))?;

        Ok(row.map(Into::into))
    }

    async fn generate_answer_identifier(&self, question_identifier: &str) -> Result<String> {
        let row: (String,) = sqlx::query_as("SELECT generate_answer_id($1::TEXT) AS answer_id")
            .bind(question_identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("generate answer id", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self, answer), fields(question_id = %answer.question_id))]
    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO answers (
                answer_id, question_id, project_id, worker_id, answer_data,
                start_time, completion_time, aht_seconds, skipped, skip_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&answer.answer_id)
        .bind(answer.question_id)
        .bind(answer.project_id)
        .bind(answer.worker_id)
        .bind(Value::Object(answer.answer_data.clone()))
        .bind(answer.start_time)
        .bind(answer.completion_time)
        .bind(answer.aht_seconds)
        .bind(answer.skipped)
        .bind(answer.skip_reason.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("insert answer", e))?;

        debug!(answer_id = %answer.answer_id, "Answer persisted");
        Ok(answer.into_answer(row.0))
    }

    async fn refresh_question_replications(
        &self,
        question_id: Uuid,
        default_required: i32,
    ) -> Result<ReplicationState> {
        let row = sqlx::query_as::<_, ReplicationRow>(
            r#"
            SELECT completed_replications, required_replications, is_answered, was_answered
            FROM refresh_question_replications($1::UUID, $2::INTEGER)
            "#,
        )
        .bind(question_id)
        .bind(default_required)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("refresh question replications", e))?
        .ok_or_else(|| WorkbenchError::not_found(format!("question {question_id}")))?;

        Ok(ReplicationState {
            completed_replications: row.completed_replications,
            required_replications: row.required_replications,
            is_answered: row.is_answered,
            was_answered: row.was_answered,
        })
    }

    async fn increment_project_completed_tasks(&self, project_id: Uuid) -> Result<()> {
        let row: (bool,) =
            sqlx::query_as("SELECT increment_project_completed_tasks($1::UUID) AS updated")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("increment project completed tasks", e))?;

        if !row.0 {
            return Err(WorkbenchError::not_found(format!("project {project_id}")));
        }
        Ok(())
    }

    async fn complete_task(&self, completion: TaskCompletion) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'completed',
                completed_at = $2,
                completion_time_seconds = $3,
                data = $4
            WHERE task_id = $1
            "#,
        )
        .bind(completion.task_id)
        .bind(completion.completed_at)
        .bind(completion.completion_time_seconds)
        .bind(Value::Object(completion.data))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("complete task", e))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TaskClaimProtocol for PgStore {
    #[instrument(skip(self))]
    async fn claim_next_task(&self, project_id: Uuid, worker_id: Uuid) -> Result<Option<ClaimedTask>> {
        let claimed = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT task_id, question_id, was_resumed
            FROM claim_next_available_question($1::UUID, $2::UUID, $3::INTEGER)
            "#,
        )
        .bind(project_id)
        .bind(worker_id)
        .bind(self.default_required_replications)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("claim next available question", e))?;

        let Some(claimed) = claimed else {
            return Ok(None);
        };

        let task = self.load_task(claimed.task_id).await?;
        let question = self.load_question(claimed.question_id).await?;
        Ok(Some(ClaimedTask {
            task,
            question,
            was_resumed: claimed.was_resumed,
        }))
    }

    async fn release_task(&self, task_id: Uuid) -> Result<bool> {
        let row: (bool,) = sqlx::query_as("SELECT release_task_reservation($1::UUID) AS released")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("release task reservation", e))?;
        Ok(row.0)
    }
}

#[async_trait]
impl QualityService for PgStore {
    async fn refresh_gold_standard_metrics(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
    ) -> Result<GoldStandardMetrics> {
        let row = sqlx::query_as::<_, QualityRow>(
            r#"
            SELECT trust_rating, gold_accuracy
            FROM update_worker_trust_rating($1::UUID, $2::UUID)
            "#,
        )
        .bind(worker_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("update worker trust rating", e))?;

        Ok(row
            .map(|row| GoldStandardMetrics {
                trust_rating: row.trust_rating,
                accuracy: row.gold_accuracy,
            })
            .unwrap_or_default())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: Uuid,
    project_id: Uuid,
    question_id: Option<Uuid>,
    row_index: i64,
    data: Value,
    status: String,
    assigned_to: Option<Uuid>,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    completion_time_seconds: Option<i64>,
}

impl TryFrom<TaskRow> for Task {
    type Error = WorkbenchError;

    fn try_from(row: TaskRow) -> Result<Self> {
        Ok(Task {
            task_id: row.task_id,
            project_id: row.project_id,
            question_id: row.question_id,
            row_index: row.row_index,
            data: object_or_empty(row.data),
            status: row.status.parse::<TaskStatus>()?,
            assigned_to: row.assigned_to,
            assigned_at: row.assigned_at,
            completed_at: row.completed_at,
            completion_time_seconds: row.completion_time_seconds,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: Uuid,
    identifier: String,
    project_id: Uuid,
    row_index: i64,
    data: Value,
    required_replications: Option<i32>,
    completed_replications: i32,
    is_answered: bool,
    is_gold_standard: bool,
    correct_answer: Option<Value>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            question_id: row.question_id,
            identifier: row.identifier,
            project_id: row.project_id,
            row_index: row.row_index,
            data: row.data,
            required_replications: row.required_replications,
            completed_replications: row.completed_replications,
            is_answered: row.is_answered,
            is_gold_standard: row.is_gold_standard,
            correct_answer: row.correct_answer,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrainingModuleRow {
    module_id: Uuid,
    title: String,
    content_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TrainingCompletionRow {
    completion_id: Uuid,
    worker_id: Uuid,
    project_id: Uuid,
    training_module_id: Uuid,
    completed_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TrainingGateRow {
    gate_id: Uuid,
    worker_id: Uuid,
    project_id: Uuid,
    gate_name: String,
    status: String,
    checked_at: DateTime<Utc>,
}

impl TryFrom<TrainingGateRow> for TrainingGateResult {
    type Error = WorkbenchError;

    fn try_from(row: TrainingGateRow) -> Result<Self> {
        Ok(TrainingGateResult {
            gate_id: row.gate_id,
            worker_id: row.worker_id,
            project_id: row.project_id,
            gate_name: row.gate_name,
            status: row.status.parse::<GateStatus>()?,
            checked_at: row.checked_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReplicationRow {
    completed_replications: i32,
    required_replications: i32,
    is_answered: bool,
    was_answered: bool,
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    task_id: Uuid,
    question_id: Uuid,
    was_resumed: bool,
}

#[derive(sqlx::FromRow)]
struct QualityRow {
    trust_rating: Option<f64>,
    gold_accuracy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_row_conversion() {
        let row = TaskRow {
            task_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            question_id: Some(Uuid::new_v4()),
            row_index: 7,
            data: json!({"text": "hola"}),
            status: "assigned".to_string(),
            assigned_to: Some(Uuid::new_v4()),
            assigned_at: Some(Utc::now()),
            completed_at: None,
            completion_time_seconds: None,
        };
        let task: Task = row.try_into().unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.data["text"], json!("hola"));
    }

    #[test]
    fn test_task_row_with_unknown_status_is_rejected() {
        let row = TaskRow {
            task_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            question_id: None,
            row_index: 0,
            data: Value::Null,
            status: "archived".to_string(),
            assigned_to: None,
            assigned_at: None,
            completed_at: None,
            completion_time_seconds: None,
        };
        assert!(Task::try_from(row).is_err());
    }

    #[test]
    fn test_gate_row_status_must_match_exactly() {
        let gate_row = |status: &str| TrainingGateRow {
            gate_id: Uuid::new_v4(),
            worker_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            gate_name: "calibration".to_string(),
            status: status.to_string(),
            checked_at: Utc::now(),
        };

        let gate: TrainingGateResult = gate_row("passed").try_into().unwrap();
        assert_eq!(gate.status, GateStatus::Passed);

        // The gate lookup fails as a whole, which the selector treats as blocked
        let rows = vec![gate_row("passed"), gate_row("PASSED")];
        let converted: Result<Vec<TrainingGateResult>> =
            rows.into_iter().map(TryInto::try_into).collect();
        assert!(converted.is_err());
        assert!(TrainingGateResult::try_from(gate_row(" passed ")).is_err());
    }
}
