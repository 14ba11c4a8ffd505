//! Difficulty tier unlocks.
//!
//! Each tier has four independent gates (completed tasks, quality score,
//! training gate, domain assessment). Tiers are evaluated independently of one
//! another, so a worker whose metrics satisfy `expert` unlocks it even if a
//! lower tier's requirements are not met.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::WorkbenchError;
use crate::models::training::{gates_passed, TrainingGateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLevel {
    /// All levels in ascending order
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
        DifficultyLevel::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
            DifficultyLevel::Expert => "expert",
        }
    }

    pub fn completion_threshold(&self) -> u64 {
        match self {
            DifficultyLevel::Beginner => 0,
            DifficultyLevel::Intermediate => 50,
            DifficultyLevel::Advanced => 150,
            DifficultyLevel::Expert => 300,
        }
    }

    /// Minimum quality score in percent; zero means no requirement
    pub fn min_quality_score(&self) -> f64 {
        match self {
            DifficultyLevel::Beginner => 0.0,
            DifficultyLevel::Intermediate => 85.0,
            DifficultyLevel::Advanced => 90.0,
            DifficultyLevel::Expert => 95.0,
        }
    }

    pub fn requires_training_gate(&self) -> bool {
        !matches!(self, DifficultyLevel::Beginner)
    }

    pub fn requires_domain_assessment(&self) -> bool {
        matches!(self, DifficultyLevel::Advanced | DifficultyLevel::Expert)
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = WorkbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            "expert" => Ok(DifficultyLevel::Expert),
            other => Err(WorkbenchError::validation(format!(
                "unknown difficulty level '{other}'"
            ))),
        }
    }
}

/// Historical performance a worker's unlocks are computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnlockMetrics {
    pub completed_tasks: u64,
    pub quality_score: Option<f64>,
    pub training_gates_passed: bool,
    pub domain_assessments_passed: bool,
}

impl UnlockMetrics {
    /// Derive metrics from raw history rows.
    ///
    /// A zero or non-finite latest quality reading is treated as "no score".
    /// Gate rows read for unlock history should be decoded with
    /// [`GateStatus::parse_normalized`](crate::constants::GateStatus::parse_normalized).
    pub fn from_history(
        units_completed: impl IntoIterator<Item = u64>,
        latest_quality: Option<f64>,
        gate_results: &[TrainingGateResult],
        assessments_passed: impl IntoIterator<Item = bool>,
    ) -> Self {
        Self {
            completed_tasks: units_completed.into_iter().sum(),
            quality_score: latest_quality.filter(|score| score.is_finite() && *score != 0.0),
            training_gates_passed: gates_passed(gate_results),
            domain_assessments_passed: assessments_passed.into_iter().any(|passed| passed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockEvaluation {
    pub difficulty: DifficultyLevel,
    pub eligible: bool,
    pub missing_reasons: Vec<String>,
}

pub fn evaluate_difficulty_criteria(
    level: DifficultyLevel,
    metrics: &UnlockMetrics,
) -> UnlockEvaluation {
    let mut reasons = Vec::new();

    let threshold = level.completion_threshold();
    if metrics.completed_tasks < threshold {
        reasons.push(format!("Requires {threshold} completed tasks"));
    }

    let min_score = level.min_quality_score();
    if min_score > 0.0 && metrics.quality_score.unwrap_or(0.0) < min_score {
        reasons.push(format!("Quality score must be at least {min_score}%"));
    }

    if level.requires_training_gate() && !metrics.training_gates_passed {
        reasons.push("Training gate completion required".to_string());
    }

    if level.requires_domain_assessment() && !metrics.domain_assessments_passed {
        reasons.push("Domain assessment must be passed".to_string());
    }

    UnlockEvaluation {
        difficulty: level,
        eligible: reasons.is_empty(),
        missing_reasons: reasons,
    }
}

/// Beginner plus every level whose gates all pass, each evaluated on its own
pub fn get_unlocked_difficulties(metrics: &UnlockMetrics) -> BTreeSet<DifficultyLevel> {
    let mut unlocked = BTreeSet::from([DifficultyLevel::Beginner]);
    for level in DifficultyLevel::ALL {
        if evaluate_difficulty_criteria(level, metrics).eligible {
            unlocked.insert(level);
        }
    }
    unlocked
}

/// Computed unlocks combined with manager-granted ones, in ascending order
pub fn merge_unlocked_levels(
    metrics: &UnlockMetrics,
    manual_unlocks: &[DifficultyLevel],
) -> Vec<DifficultyLevel> {
    let mut unlocked = get_unlocked_difficulties(metrics);
    unlocked.extend(manual_unlocks.iter().copied());
    unlocked.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockRequirements {
    pub completed_tasks: u64,
    pub target_tasks: Option<u64>,
    pub quality_score: Option<f64>,
    pub required_quality_score: Option<f64>,
    pub training_gate_required: bool,
    pub training_gate_passed: bool,
    pub domain_assessment_required: bool,
    pub domain_assessment_passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockProgress {
    pub unlocked_levels: Vec<DifficultyLevel>,
    pub next_level: Option<DifficultyLevel>,
    /// Progress toward the next level's task threshold, 0-100
    pub completion_percent: u8,
    pub remaining_tasks: Option<u64>,
    pub requirements: UnlockRequirements,
}

/// Progress toward the first level (in ascending order) not yet unlocked
pub fn unlock_progress(metrics: &UnlockMetrics, manual_unlocks: &[DifficultyLevel]) -> UnlockProgress {
    let unlocked_levels = merge_unlocked_levels(metrics, manual_unlocks);
    let next_level = DifficultyLevel::ALL
        .into_iter()
        .find(|level| !unlocked_levels.contains(level));
    let current_level = unlocked_levels
        .last()
        .copied()
        .unwrap_or(DifficultyLevel::Beginner);

    let previous_threshold = current_level.completion_threshold() as f64;
    let (completion_percent, remaining_tasks, target_tasks) = match next_level {
        Some(next) => {
            let target = next.completion_threshold();
            let span = (target as f64 - previous_threshold).max(1.0);
            let raw = (metrics.completed_tasks as f64 - previous_threshold) / span * 100.0;
            let percent = raw.round().clamp(0.0, 100.0) as u8;
            (
                percent,
                Some(target.saturating_sub(metrics.completed_tasks)),
                Some(target),
            )
        }
        None => (100, None, None),
    };

    UnlockProgress {
        requirements: UnlockRequirements {
            completed_tasks: metrics.completed_tasks,
            target_tasks,
            quality_score: metrics.quality_score,
            required_quality_score: next_level.map(|level| level.min_quality_score()),
            training_gate_required: next_level.is_some_and(|level| level.requires_training_gate()),
            training_gate_passed: metrics.training_gates_passed,
            domain_assessment_required: next_level
                .is_some_and(|level| level.requires_domain_assessment()),
            domain_assessment_passed: metrics.domain_assessments_passed,
        },
        unlocked_levels,
        next_level,
        completion_percent,
        remaining_tasks,
    }
}
