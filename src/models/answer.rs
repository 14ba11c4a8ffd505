//! # Answer Model
//!
//! Immutable record of one worker's submission for one question.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    /// Human-readable identifier generated by the store, scoped to the question
    pub answer_id: String,
    pub question_id: Uuid,
    pub project_id: Uuid,
    pub worker_id: Uuid,
    pub answer_data: Map<String, Value>,
    pub start_time: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    pub aht_seconds: i64,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

/// Insert payload for [`Answer`]; the store assigns the row id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnswer {
    pub answer_id: String,
    pub question_id: Uuid,
    pub project_id: Uuid,
    pub worker_id: Uuid,
    pub answer_data: Map<String, Value>,
    pub start_time: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    pub aht_seconds: i64,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

impl NewAnswer {
    pub fn into_answer(self, id: Uuid) -> Answer {
        Answer {
            id,
            answer_id: self.answer_id,
            question_id: self.question_id,
            project_id: self.project_id,
            worker_id: self.worker_id,
            answer_data: self.answer_data,
            start_time: self.start_time,
            completion_time: self.completion_time,
            aht_seconds: self.aht_seconds,
            skipped: self.skipped,
            skip_reason: self.skip_reason,
        }
    }
}

/// Whole seconds between start and completion, never negative
pub fn handle_time_seconds(start: DateTime<Utc>, completion: DateTime<Utc>) -> i64 {
    let millis = (completion - start).num_milliseconds();
    (millis.div_euclid(1000)).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_handle_time_floors_to_seconds() {
        let start = Utc::now();
        assert_eq!(handle_time_seconds(start, start + Duration::milliseconds(59_999)), 59);
        assert_eq!(handle_time_seconds(start, start + Duration::seconds(90)), 90);
        assert_eq!(handle_time_seconds(start, start), 0);
    }

    #[test]
    fn test_handle_time_clamps_clock_skew() {
        let start = Utc::now();
        assert_eq!(handle_time_seconds(start, start - Duration::milliseconds(1500)), 0);
    }
}
