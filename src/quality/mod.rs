//! # Quality Control
//!
//! Gold-standard answer scoring and worker quality aggregation.

pub mod gold_standard;
pub mod quality_score;

use serde::{Deserialize, Serialize};

pub use gold_standard::{matches_gold_answer, stable_stringify};
pub use quality_score::{QualityMetricSample, WorkerQualityScore};

/// Trust and accuracy figures returned by a gold-standard refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoldStandardMetrics {
    pub trust_rating: Option<f64>,
    pub accuracy: Option<f64>,
}
