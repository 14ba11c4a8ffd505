//! # Worker Model
//!
//! Workers are never deleted. Administrative actions move them between
//! statuses, and a termination record is kept for rehire decisions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::constants::WorkerStatus;
use crate::eligibility::difficulty::DifficultyLevel;
use crate::eligibility::rehire::{
    evaluate_rehire_eligibility, OffboardingTrigger, RehireEligibilityInput,
    RehireEligibilityResult,
};
use crate::error::{Result, WorkbenchError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRecord {
    pub reason: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: Uuid,
    pub display_name: String,
    pub status: WorkerStatus,
    pub current_difficulty: DifficultyLevel,
    /// Training modules this worker has completed
    pub completed_training: BTreeSet<Uuid>,
    pub quality_score: Option<f64>,
    pub termination: Option<TerminationRecord>,
}

impl Worker {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            display_name: display_name.into(),
            status: WorkerStatus::Active,
            current_difficulty: DifficultyLevel::Beginner,
            completed_training: BTreeSet::new(),
            quality_score: None,
            termination: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.status == WorkerStatus::Terminated
    }

    /// Record a termination through one of the offboarding paths
    pub fn terminate(&mut self, trigger: OffboardingTrigger, on: NaiveDate) -> Result<()> {
        if self.is_terminated() {
            return Err(WorkbenchError::StateError(format!(
                "worker {} is already terminated",
                self.worker_id
            )));
        }
        self.status = WorkerStatus::Terminated;
        self.termination = Some(TerminationRecord {
            reason: trigger.termination_reason().to_string(),
            date: Some(on),
        });
        Ok(())
    }

    /// Rehire eligibility as of `today`, based on the recorded termination
    pub fn rehire_eligibility(&self, today: NaiveDate) -> RehireEligibilityResult {
        let input = RehireEligibilityInput {
            termination_reason: self.termination.as_ref().map(|t| t.reason.clone()),
            termination_date: self
                .termination
                .as_ref()
                .and_then(|t| t.date)
                .map(|date| date.format("%Y-%m-%d").to_string()),
            today: Some(today),
        };
        evaluate_rehire_eligibility(&input)
    }

    /// Reactivate a terminated worker if the rehire policy allows it.
    /// The termination record is kept for history.
    pub fn rehire(&mut self, today: NaiveDate) -> Result<RehireEligibilityResult> {
        if !self.is_terminated() {
            return Err(WorkbenchError::StateError(format!(
                "worker {} is not terminated",
                self.worker_id
            )));
        }
        let eligibility = self.rehire_eligibility(today);
        if !eligibility.eligible {
            return Err(WorkbenchError::validation(format!(
                "worker {} is not eligible for rehire ({})",
                self.worker_id,
                eligibility.reason_code.as_str()
            )));
        }
        self.status = WorkerStatus::Active;
        Ok(eligibility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_terminate_twice_is_rejected() {
        let mut worker = Worker::new("Ada");
        worker
            .terminate(OffboardingTrigger::Voluntary, date("2024-01-01"))
            .unwrap();
        assert!(worker.is_terminated());
        assert!(worker
            .terminate(OffboardingTrigger::Policy, date("2024-01-02"))
            .is_err());
    }

    #[test]
    fn test_rehire_after_performance_cooldown() {
        let mut worker = Worker::new("Grace");
        worker
            .terminate(OffboardingTrigger::Performance, date("2024-01-15"))
            .unwrap();

        assert!(worker.rehire(date("2024-07-15")).is_err());
        assert!(worker.is_terminated());

        let result = worker.rehire(date("2024-07-16")).unwrap();
        assert!(result.eligible);
        assert_eq!(worker.status, WorkerStatus::Active);
        assert!(worker.termination.is_some());
    }

    #[test]
    fn test_policy_violation_blocks_rehire() {
        let mut worker = Worker::new("Linus");
        worker
            .terminate(OffboardingTrigger::Policy, date("2020-01-01"))
            .unwrap();
        let err = worker.rehire(date("2030-01-01")).unwrap_err();
        assert!(err.to_string().contains("policy_block"));
    }

    #[test]
    fn test_rehire_requires_termination() {
        let mut worker = Worker::new("Ken");
        assert!(matches!(
            worker.rehire(date("2024-01-01")),
            Err(WorkbenchError::StateError(_))
        ));
    }
}
