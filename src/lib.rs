//! Guardrail: repository maintainability auditor
//!
//! Scores a repository across five quality dimensions, keeps a bounded history
//! of score snapshots, classifies trends between consecutive snapshots, applies
//! a small set of mechanical fixes and renders a weekly markdown report.
//!
//! All state lives in flat JSON files under `.guardrail/` at the repository
//! root. The tool is a one-shot batch command: concurrent invocations against
//! the same repository are not supported and may race on those files.

pub mod analyzer;
pub mod config;
pub mod docs;
pub mod fixer;
pub mod history;
pub mod hook;
pub mod memory;
pub mod report;
pub mod reporter;
pub mod scanner;
pub mod state;
pub mod trend;
pub mod workspace;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lowest score classified as GREEN
pub const GREEN_THRESHOLD: f64 = 75.0;
/// Lowest score classified as YELLOW
pub const YELLOW_THRESHOLD: f64 = 50.0;
/// Changes strictly beyond this many points leave the stable band
pub const TREND_DEAD_ZONE: f64 = 5.0;

/// Ordered map keyed by quality dimension
pub type DimensionMap<T> = BTreeMap<Dimension, T>;

/// A scored quality axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CodeQuality,
    Testing,
    Deployment,
    Documentation,
    PrdCompliance,
}

impl Dimension {
    /// All dimensions in report order
    pub const ALL: [Dimension; 5] = [
        Dimension::CodeQuality,
        Dimension::Testing,
        Dimension::Deployment,
        Dimension::Documentation,
        Dimension::PrdCompliance,
    ];

    /// Identifier used in persisted files and issue prefixes
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::CodeQuality => "code_quality",
            Dimension::Testing => "testing",
            Dimension::Deployment => "deployment",
            Dimension::Documentation => "documentation",
            Dimension::PrdCompliance => "prd_compliance",
        }
    }

    /// Human-readable title for reports
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::CodeQuality => "Code Quality",
            Dimension::Testing => "Testing",
            Dimension::Deployment => "Deployment",
            Dimension::Documentation => "Documentation",
            Dimension::PrdCompliance => "Prd Compliance",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Dimension::ALL.iter().map(|d| d.as_str()).collect();
                format!("unknown dimension '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// RED/YELLOW/GREEN classification of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Red,
    Yellow,
    Green,
}

impl Tier {
    /// Classify with the default 50/75 bands. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        Self::classify(score, GREEN_THRESHOLD, YELLOW_THRESHOLD)
    }

    /// Classify with explicit band lower bounds
    pub fn classify(score: f64, green: f64, yellow: f64) -> Self {
        if score >= green {
            Tier::Green
        } else if score >= yellow {
            Tier::Yellow
        } else {
            Tier::Red
        }
    }

    /// Upper-case label without emoji (terminals and markdown)
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Red => "RED",
            Tier::Yellow => "YELLOW",
            Tier::Green => "GREEN",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Red => write!(f, "red"),
            Tier::Yellow => write!(f, "yellow"),
            Tier::Green => write!(f, "green"),
        }
    }
}

/// Direction of a score change between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Improving,
    Stable,
    Worsening,
}

impl Direction {
    /// Classify a signed change. The ±5 band is stable, boundaries included.
    pub fn from_change(change: f64) -> Self {
        if change > TREND_DEAD_ZONE {
            Direction::Improving
        } else if change < -TREND_DEAD_ZONE {
            Direction::Worsening
        } else {
            Direction::Stable
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Improving => write!(f, "improving"),
            Direction::Stable => write!(f, "stable"),
            Direction::Worsening => write!(f, "worsening"),
        }
    }
}

/// Score for a single dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub tier: Tier,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Raw probe results behind the score (tool status, file presence)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// Metadata recorded with each audit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    /// Whether external linters and test runners were invoked
    pub full_audit: bool,
    pub repo_path: String,
}

/// One timestamped audit result across all dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    pub timestamp: String,
    pub overall_score: f64,
    pub overall_tier: Tier,
    pub dimensions: DimensionMap<DimensionScore>,
    #[serde(default)]
    pub critical_issues: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metadata: AuditMetadata,
}

impl AuditSnapshot {
    /// Placeholder used by the report when no audit has run yet
    pub fn empty(timestamp: String) -> Self {
        Self {
            timestamp,
            overall_score: 0.0,
            overall_tier: Tier::Red,
            dimensions: DimensionMap::new(),
            critical_issues: vec!["No audit data available".to_string()],
            warnings: Vec::new(),
            metadata: AuditMetadata::default(),
        }
    }

    /// Per-dimension numeric scores
    pub fn scores(&self) -> DimensionMap<f64> {
        self.dimensions
            .iter()
            .map(|(dim, s)| (*dim, s.score))
            .collect()
    }

    /// Dimensions in the given tier, in report order
    pub fn dimensions_in(&self, tier: Tier) -> Vec<Dimension> {
        self.dimensions
            .iter()
            .filter(|(_, s)| s.tier == tier)
            .map(|(dim, _)| *dim)
            .collect()
    }
}

/// Current UTC time as an RFC 3339 string
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
