//! Score calculation for quality dimensions

use crate::config::Thresholds;
use crate::{Dimension, DimensionMap, DimensionScore};

/// Every dimension starts from a perfect score
pub const PERFECT_SCORE: f64 = 100.0;

/// Per-dimension score accumulator.
///
/// Deductions are applied in order and the result is clamped to `0..=100`
/// once, when the card is finished.
#[derive(Debug, Clone)]
pub struct ScoreCard {
    score: f64,
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl Default for ScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard {
    pub fn new() -> Self {
        Self {
            score: PERFECT_SCORE,
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Deduct a fixed number of points and record the issue
    pub fn deduct(&mut self, points: f64, issue: impl Into<String>) -> &mut Self {
        self.score -= points;
        self.issues.push(issue.into());
        self
    }

    /// Deduct `per_item * count` points, at most `cap`
    pub fn deduct_scaled(
        &mut self,
        count: usize,
        per_item: f64,
        cap: f64,
        issue: impl Into<String>,
    ) -> &mut Self {
        let points = scaled_penalty(count, per_item, cap);
        self.deduct(points, issue)
    }

    /// Record an issue without changing the score
    pub fn note(&mut self, issue: impl Into<String>) -> &mut Self {
        self.issues.push(issue.into());
        self
    }

    pub fn recommend(&mut self, recommendation: impl Into<String>) -> &mut Self {
        self.recommendations.push(recommendation.into());
        self
    }

    /// Replace the running score outright (ratio-based dimensions)
    pub fn set_score(&mut self, score: f64) -> &mut Self {
        self.score = score;
        self
    }

    /// Current unclamped score
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn finish(self, thresholds: &Thresholds, details: serde_json::Value) -> DimensionScore {
        let score = clamp_score(self.score);
        DimensionScore {
            score,
            tier: thresholds.classify(score),
            issues: self.issues,
            recommendations: self.recommendations,
            details,
        }
    }
}

/// Count-scaled penalty with a per-category cap
pub fn scaled_penalty(count: usize, per_item: f64, cap: f64) -> f64 {
    (count as f64 * per_item).min(cap)
}

/// Clamp to the valid score range; NaN becomes 0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, PERFECT_SCORE)
    }
}

/// Weighted average over dimensions that are both scored and weighted.
/// A zero total weight yields 0.0.
pub fn weighted_score(scores: &DimensionMap<f64>, weights: &DimensionMap<f64>) -> f64 {
    let (total, total_weight) = scores
        .iter()
        .filter_map(|(dim, score)| weights.get(dim).map(|w| (score, w)))
        .fold((0.0, 0.0), |(total, weight_sum), (score, weight)| {
            (total + score * weight, weight_sum + weight)
        });

    if total_weight == 0.0 {
        return 0.0;
    }
    total / total_weight
}

/// Prefix each issue with its dimension, e.g. `[testing] No backend tests found`
pub fn tagged_issues(dimension: Dimension, issues: &[String]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| format!("[{}] {}", dimension, issue))
        .collect()
}
