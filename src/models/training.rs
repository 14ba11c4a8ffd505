//! # Training Records
//!
//! Training content, per-worker completions, and gate check results that
//! decide whether a worker may be routed into a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::GateStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingModule {
    pub module_id: Uuid,
    pub title: String,
    pub content_url: Option<String>,
}

/// Worker x project x module completion record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCompletion {
    pub completion_id: Uuid,
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub training_module_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// One gate check for a worker in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingGateResult {
    pub gate_id: Uuid,
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub gate_name: String,
    pub status: GateStatus,
    pub checked_at: DateTime<Utc>,
}

/// A gate set passes only when it is non-empty and every check passed
pub fn gates_passed(results: &[TrainingGateResult]) -> bool {
    !results.is_empty() && results.iter().all(|gate| gate.status == GateStatus::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(status: GateStatus) -> TrainingGateResult {
        TrainingGateResult {
            gate_id: Uuid::new_v4(),
            worker_id: Uuid::nil(),
            project_id: Uuid::nil(),
            gate_name: "calibration".to_string(),
            status,
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_gate_set_fails() {
        assert!(!gates_passed(&[]));
    }

    #[test]
    fn test_all_gates_must_pass() {
        assert!(gates_passed(&[gate(GateStatus::Passed), gate(GateStatus::Passed)]));
        assert!(!gates_passed(&[gate(GateStatus::Passed), gate(GateStatus::Pending)]));
        assert!(!gates_passed(&[gate(GateStatus::Failed)]));
    }
}
