//! # System Constants
//!
//! Core enums and numeric policy that define the operational boundaries of the
//! assignment engine. String forms match the values persisted by the datastore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorkbenchError;

/// Submission lifecycle events published on the pipeline's event channel
pub mod events {
    pub const ANSWER_RECORDED: &str = "answer.recorded";
    pub const QUESTION_COMPLETED: &str = "question.completed";
    pub const GOLD_STANDARD_SCORED: &str = "gold_standard.scored";
    pub const TASK_COMPLETION_DEFERRED: &str = "task.completion_deferred";
}

/// Numeric policy shared across components
pub mod system {
    /// Maximum number of prioritized assignments considered per selection
    pub const DEFAULT_PROJECT_LIMIT: usize = 20;
    /// Required replications assumed when a question does not specify any
    pub const DEFAULT_REQUIRED_REPLICATIONS: i32 = 1;
    /// Cooldown before a worker removed for performance may be rehired
    pub const PERFORMANCE_REHIRE_COOLDOWN_MONTHS: u32 = 6;
    pub const CLIENT_LOG_BUFFER_LIMIT: usize = 50;
    pub const CLIENT_LOG_FLUSH_INTERVAL_MS: u64 = 1500;
    /// Number of recent quality samples reported alongside a score
    pub const QUALITY_RECENT_SAMPLE_LIMIT: usize = 25;
    pub const EVENT_CHANNEL_CAPACITY: usize = 1000;
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = WorkbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "paused" => Ok(ProjectStatus::Paused),
            "completed" => Ok(ProjectStatus::Completed),
            other => Err(WorkbenchError::validation(format!(
                "unknown project status '{other}'"
            ))),
        }
    }
}

/// Task row status. A claimed task moves `pending -> assigned -> completed`;
/// `in_progress` is reported by clients that resume a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Whether a task in this status counts as a live reservation
    pub fn is_reserved(&self) -> bool {
        matches!(self, TaskStatus::Assigned | TaskStatus::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = WorkbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "assigned" => Ok(TaskStatus::Assigned),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(WorkbenchError::validation(format!(
                "unknown task status '{other}'"
            ))),
        }
    }
}

/// Outcome of a single training gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pending,
    Passed,
    Failed,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Pending => "pending",
            GateStatus::Passed => "passed",
            GateStatus::Failed => "failed",
        }
    }
}

impl GateStatus {
    /// Lenient parse for unlock history, which tolerates case and padding.
    /// Routing uses the exact `FromStr` form instead.
    pub fn parse_normalized(s: &str) -> Result<Self, WorkbenchError> {
        s.trim().to_ascii_lowercase().parse()
    }
}

impl FromStr for GateStatus {
    type Err = WorkbenchError;

    /// Exact match only; anything else is rejected rather than read as passed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GateStatus::Pending),
            "passed" => Ok(GateStatus::Passed),
            "failed" => Ok(GateStatus::Failed),
            other => Err(WorkbenchError::validation(format!(
                "unknown gate status '{other}'"
            ))),
        }
    }
}

/// Worker account status. Workers are never deleted, only transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Active,
    Inactive,
    Terminated,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Active => "active",
            WorkerStatus::Inactive => "inactive",
            WorkerStatus::Terminated => "terminated",
        }
    }
}

/// Why a project was selected for the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Available,
    TrainingRequired,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionReason::Available => "available",
            SelectionReason::TrainingRequired => "training_required",
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_round_trip() {
        for status in [
            ProjectStatus::Active,
            ProjectStatus::Paused,
            ProjectStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_gate_status_parse_is_exact() {
        assert_eq!("passed".parse::<GateStatus>().unwrap(), GateStatus::Passed);
        assert!("PASSED".parse::<GateStatus>().is_err());
        assert!(" passed ".parse::<GateStatus>().is_err());
        assert!("ok".parse::<GateStatus>().is_err());
    }

    #[test]
    fn test_gate_status_normalized_parse() {
        assert_eq!(GateStatus::parse_normalized("PASSED").unwrap(), GateStatus::Passed);
        assert_eq!(GateStatus::parse_normalized(" failed ").unwrap(), GateStatus::Failed);
        assert!(GateStatus::parse_normalized("ok").is_err());
    }

    #[test]
    fn test_reserved_task_statuses() {
        assert!(TaskStatus::Assigned.is_reserved());
        assert!(TaskStatus::InProgress.is_reserved());
        assert!(!TaskStatus::Pending.is_reserved());
        assert!(!TaskStatus::Completed.is_reserved());
    }

    #[test]
    fn test_selection_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SelectionReason::TrainingRequired).unwrap();
        assert_eq!(json, "\"training_required\"");
    }
}
