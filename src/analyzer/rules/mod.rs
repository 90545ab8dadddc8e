//! Scoring rules, one per quality dimension

pub mod code_quality;
pub mod deployment;
pub mod documentation;
pub mod prd_compliance;
pub mod testing;

pub use code_quality::CodeQualityRule;
pub use deployment::DeploymentRule;
pub use documentation::DocumentationRule;
pub use prd_compliance::PrdComplianceRule;
pub use testing::TestingRule;

use super::tools::ToolRunner;
use crate::config::Thresholds;
use crate::scanner::PrdMapping;
use crate::{Dimension, DimensionScore};
use anyhow::Result;
use std::path::Path;

/// Everything a rule may look at
pub struct AuditContext<'a> {
    pub repo_root: &'a Path,
    pub thresholds: &'a Thresholds,
    /// Mapping cached by the last baseline scan
    pub prd_mapping: &'a PrdMapping,
    pub runner: &'a dyn ToolRunner,
    /// Run external tools (lint, tests)
    pub full: bool,
}

impl AuditContext<'_> {
    /// Whether a path relative to the repository root exists
    pub fn exists(&self, rel: &str) -> bool {
        self.repo_root.join(rel).exists()
    }
}

/// Trait for dimension scoring rules
pub trait DimensionRule {
    /// Dimension this rule scores
    fn dimension(&self) -> Dimension;

    /// Probe the repository and score it
    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore>;
}

/// All rules in report order
pub fn all_rules() -> Vec<Box<dyn DimensionRule>> {
    vec![
        Box::new(CodeQualityRule),
        Box::new(TestingRule),
        Box::new(DeploymentRule),
        Box::new(DocumentationRule),
        Box::new(PrdComplianceRule),
    ]
}
