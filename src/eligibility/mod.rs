//! # Eligibility Rules
//!
//! Pure policy functions over historical worker metrics: which difficulty tiers
//! a worker has unlocked and whether a terminated worker may be rehired.
//! Nothing in this module performs I/O.

pub mod difficulty;
pub mod rehire;

pub use difficulty::{
    evaluate_difficulty_criteria, get_unlocked_difficulties, merge_unlocked_levels,
    unlock_progress, DifficultyLevel, UnlockEvaluation, UnlockMetrics, UnlockProgress,
    UnlockRequirements,
};
pub use rehire::{
    add_calendar_months, evaluate_rehire_eligibility, OffboardingTrigger, RehireEligibilityInput,
    RehireEligibilityResult, RehireReasonCode,
};
