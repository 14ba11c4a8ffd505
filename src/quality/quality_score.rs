//! Composite worker quality score.
//!
//! The composite is the mean of `quality` samples (already in percent). When a
//! worker has no quality samples, the mean gold-standard `accuracy` (a 0-1
//! ratio) is scaled to percent instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::system::QUALITY_RECENT_SAMPLE_LIMIT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetricSample {
    pub metric_type: String,
    pub metric_value: f64,
    pub measured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerQualityScore {
    pub worker_id: Uuid,
    pub project_id: Option<Uuid>,
    pub composite_score: Option<f64>,
    pub gold_standard_accuracy: Option<f64>,
    pub quality_samples: usize,
    pub accuracy_samples: usize,
    /// Most recent samples first
    pub recent_metrics: Vec<QualityMetricSample>,
}

impl WorkerQualityScore {
    pub fn from_metrics(
        worker_id: Uuid,
        project_id: Option<Uuid>,
        mut samples: Vec<QualityMetricSample>,
    ) -> Self {
        samples.sort_by(|a, b| b.measured_at.cmp(&a.measured_at));

        let mut quality_values = Vec::new();
        let mut accuracy_values = Vec::new();
        for sample in samples.iter().filter(|s| s.metric_value.is_finite()) {
            match sample.metric_type.to_ascii_lowercase().as_str() {
                "quality" => quality_values.push(sample.metric_value),
                "accuracy" => accuracy_values.push(sample.metric_value),
                _ => {}
            }
        }

        let quality_average = average(&quality_values);
        let accuracy_average = average(&accuracy_values);
        let composite_score = quality_average
            .map(round_two)
            .or_else(|| accuracy_average.map(|accuracy| round_two(accuracy * 100.0)));

        samples.truncate(QUALITY_RECENT_SAMPLE_LIMIT);

        Self {
            worker_id,
            project_id,
            composite_score,
            gold_standard_accuracy: accuracy_average,
            quality_samples: quality_values.len(),
            accuracy_samples: accuracy_values.len(),
            recent_metrics: samples,
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
