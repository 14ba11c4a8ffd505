//! # Question Model
//!
//! A unit of annotation work that needs a number of independent replications.
//! `completed_replications` always mirrors the number of persisted answers and
//! `is_answered` is derived from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: Uuid,
    /// Human-readable identifier, unique within the project
    pub identifier: String,
    pub project_id: Uuid,
    pub row_index: i64,
    pub data: Value,
    pub required_replications: Option<i32>,
    pub completed_replications: i32,
    pub is_answered: bool,
    pub is_gold_standard: bool,
    pub correct_answer: Option<Value>,
}

impl Question {
    pub fn new(project_id: Uuid, identifier: impl Into<String>, row_index: i64) -> Self {
        Self {
            question_id: Uuid::new_v4(),
            identifier: identifier.into(),
            project_id,
            row_index,
            data: Value::Object(Default::default()),
            required_replications: None,
            completed_replications: 0,
            is_answered: false,
            is_gold_standard: false,
            correct_answer: None,
        }
    }

    pub fn with_required_replications(mut self, required: i32) -> Self {
        self.required_replications = Some(required);
        self
    }

    pub fn with_gold_answer(mut self, correct_answer: Value) -> Self {
        self.is_gold_standard = true;
        self.correct_answer = Some(correct_answer);
        self
    }

    /// Required replications, substituting `default` when unset or non-positive
    pub fn required_replications_or(&self, default: i32) -> i32 {
        match self.required_replications {
            Some(required) if required > 0 => required,
            _ => default,
        }
    }

    /// Apply a fresh answer count, keeping `is_answered` consistent with it
    pub fn apply_answer_count(&mut self, answer_count: i32, default_required: i32) {
        self.completed_replications = answer_count;
        self.is_answered = answer_count >= self.required_replications_or(default_required);
    }
}

/// Replication counters returned by an atomic recount of a question's answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationState {
    pub completed_replications: i32,
    pub required_replications: i32,
    pub is_answered: bool,
    /// `is_answered` before this recount
    pub was_answered: bool,
}

impl ReplicationState {
    /// True when this recount moved the question into the answered state
    pub fn became_answered(&self) -> bool {
        self.is_answered && !self.was_answered
    }
}
