//! Config schema and deserialization

use crate::{Dimension, DimensionMap, Tier, GREEN_THRESHOLD, YELLOW_THRESHOLD};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: &str = "1.0.0";

/// Tier band lower bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub green: f64,
    pub yellow: f64,
    pub red: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green: GREEN_THRESHOLD,
            yellow: YELLOW_THRESHOLD,
            red: 0.0,
        }
    }
}

impl Thresholds {
    /// Classify a score against these bands
    pub fn classify(&self, score: f64) -> Tier {
        Tier::classify(score, self.green, self.yellow)
    }
}

/// Pre-commit hook gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHookConfig {
    pub enabled: bool,
    /// Overall score below this fails `git-check`
    pub min_score: f64,
    /// When false a failing check only warns
    pub block_on_fail: bool,
}

impl Default for GitHookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_score: 70.0,
            block_on_fail: true,
        }
    }
}

/// Root config structure for .guardrail/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub thresholds: Thresholds,
    /// Weight per dimension; expected to sum to 100, normalized regardless
    pub scoring: DimensionMap<f64>,
    pub git_hook: GitHookConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            thresholds: Thresholds::default(),
            scoring: default_weights(),
            git_hook: GitHookConfig::default(),
        }
    }
}

/// Default dimension weights (sum to 100)
pub fn default_weights() -> DimensionMap<f64> {
    DimensionMap::from([
        (Dimension::CodeQuality, 25.0),
        (Dimension::Testing, 25.0),
        (Dimension::Deployment, 20.0),
        (Dimension::Documentation, 15.0),
        (Dimension::PrdCompliance, 15.0),
    ])
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli_min_score: Option<f64>) -> Self {
        if let Some(min_score) = cli_min_score {
            self.git_hook.min_score = min_score;
        }
        self
    }

    /// Sum of all configured weights
    pub fn weight_total(&self) -> f64 {
        self.scoring.values().sum()
    }

    /// Human-readable problems that do not prevent loading
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        let total = self.weight_total();
        if (total - 100.0).abs() > 0.5 {
            out.push(format!(
                "scoring weights sum to {:.1}, not 100; overall score is normalized",
                total
            ));
        }
        for (dim, weight) in &self.scoring {
            if *weight < 0.0 {
                out.push(format!("negative weight {} for {}", weight, dim));
            }
        }
        if self.thresholds.yellow > self.thresholds.green {
            out.push(format!(
                "yellow threshold {} is above green threshold {}",
                self.thresholds.yellow, self.thresholds.green
            ));
        }
        out
    }
}
