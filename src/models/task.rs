//! # Task Model
//!
//! A claimable row bound to one question. At most one worker holds a task at a
//! time; the reservation itself is enforced by the store's claim primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::TaskStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub question_id: Option<Uuid>,
    pub row_index: i64,
    pub data: Map<String, Value>,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_time_seconds: Option<i64>,
}

impl Task {
    pub fn new(project_id: Uuid, question_id: Uuid, row_index: i64) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            project_id,
            question_id: Some(question_id),
            row_index,
            data: Map::new(),
            status: TaskStatus::Pending,
            assigned_to: None,
            assigned_at: None,
            completed_at: None,
            completion_time_seconds: None,
        }
    }

    /// Whether `worker_id` currently holds this task
    pub fn is_reserved_by(&self, worker_id: Uuid) -> bool {
        self.status.is_reserved() && self.assigned_to == Some(worker_id)
    }

    /// Task data after a submission: the skip marker for skipped work,
    /// otherwise the submitted fields layered over the existing row data.
    pub fn merged_completion_data(
        &self,
        form_data: &Map<String, Value>,
        skipped: bool,
        skip_reason: Option<&str>,
    ) -> Map<String, Value> {
        let mut merged = self.data.clone();
        if skipped {
            merged.insert("skipped".to_string(), Value::Bool(true));
            merged.insert(
                "skip_reason".to_string(),
                skip_reason
                    .map(|reason| Value::String(reason.to_string()))
                    .unwrap_or(Value::Null),
            );
        } else {
            for (key, value) in form_data {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

/// Completion write for a task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub completion_time_seconds: i64,
    pub data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_with_data() -> Task {
        let mut task = Task::new(Uuid::new_v4(), Uuid::new_v4(), 3);
        task.data.insert("source_text".into(), json!("hello"));
        task.data.insert("label".into(), json!("old"));
        task
    }

    #[test]
    fn test_merge_overlays_form_fields() {
        let task = task_with_data();
        let form = json!({"label": "positive", "notes": "clear"});
        let merged = task.merged_completion_data(form.as_object().unwrap(), false, None);

        assert_eq!(merged["source_text"], json!("hello"));
        assert_eq!(merged["label"], json!("positive"));
        assert_eq!(merged["notes"], json!("clear"));
        assert!(!merged.contains_key("skipped"));
    }

    #[test]
    fn test_merge_for_skip_ignores_form_fields() {
        let task = task_with_data();
        let form = json!({"label": "positive"});
        let merged =
            task.merged_completion_data(form.as_object().unwrap(), true, Some("audio missing"));

        assert_eq!(merged["label"], json!("old"));
        assert_eq!(merged["skipped"], json!(true));
        assert_eq!(merged["skip_reason"], json!("audio missing"));
    }

    #[test]
    fn test_reservation_ownership() {
        let worker = Uuid::new_v4();
        let mut task = task_with_data();
        assert!(!task.is_reserved_by(worker));

        task.status = TaskStatus::Assigned;
        task.assigned_to = Some(worker);
        assert!(task.is_reserved_by(worker));
        assert!(!task.is_reserved_by(Uuid::new_v4()));

        task.status = TaskStatus::Completed;
        assert!(!task.is_reserved_by(worker));
    }
}
