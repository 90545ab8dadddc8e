//! Audit engine - runs every dimension rule and aggregates the snapshot

use super::rules::{all_rules, AuditContext, DimensionRule};
use super::scoring::{tagged_issues, weighted_score};
use super::tools::{SystemRunner, ToolRunner};
use crate::config::Config;
use crate::scanner::PrdMapping;
use crate::{AuditMetadata, AuditSnapshot, DimensionMap, Tier};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Scores a repository across all dimensions
pub struct Auditor<'a> {
    config: &'a Config,
    prd_mapping: &'a PrdMapping,
    runner: Box<dyn ToolRunner + 'a>,
    rules: Vec<Box<dyn DimensionRule>>,
}

impl<'a> Auditor<'a> {
    pub fn new(config: &'a Config, prd_mapping: &'a PrdMapping) -> Self {
        Self {
            config,
            prd_mapping,
            runner: Box::new(SystemRunner),
            rules: all_rules(),
        }
    }

    /// Replace the process runner (tests)
    pub fn with_runner(mut self, runner: impl ToolRunner + 'a) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Run the audit. `full` enables external lint and test runs.
    pub fn audit(&self, repo_root: &Path, full: bool) -> Result<AuditSnapshot> {
        info!(
            "Running {} maintainability audit...",
            if full { "full" } else { "quick" }
        );

        let ctx = AuditContext {
            repo_root,
            thresholds: &self.config.thresholds,
            prd_mapping: self.prd_mapping,
            runner: self.runner.as_ref(),
            full,
        };

        let mut dimensions = DimensionMap::new();
        for rule in &self.rules {
            let dim = rule.dimension();
            info!("  Evaluating {}...", dim.title().to_lowercase());
            let score = rule
                .evaluate(&ctx)
                .with_context(|| format!("Failed to evaluate {}", dim))?;
            dimensions.insert(dim, score);
        }

        let scores = dimensions.iter().map(|(d, s)| (*d, s.score)).collect();
        let overall_score = weighted_score(&scores, &self.config.scoring);
        let overall_tier = self.config.thresholds.classify(overall_score);

        let mut critical_issues = Vec::new();
        let mut warnings = Vec::new();
        for (dim, score) in &dimensions {
            match score.tier {
                Tier::Red => critical_issues.extend(tagged_issues(*dim, &score.issues)),
                Tier::Yellow => warnings.extend(tagged_issues(*dim, &score.issues)),
                Tier::Green => {}
            }
        }

        info!(
            "Audit complete: Overall score {:.1} ({})",
            overall_score, overall_tier
        );

        Ok(AuditSnapshot {
            timestamp: crate::now_timestamp(),
            overall_score,
            overall_tier,
            dimensions,
            critical_issues,
            warnings,
            metadata: AuditMetadata {
                full_audit: full,
                repo_path: repo_root.display().to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_support::write;
    use crate::analyzer::tools::fake::FakeRunner;
    use crate::Dimension;

    #[test]
    fn empty_repo_audit() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let mapping = PrdMapping::NotScanned;
        let snap = Auditor::new(&config, &mapping)
            .with_runner(FakeRunner::default())
            .audit(dir.path(), false)
            .unwrap();

        assert_eq!(snap.dimensions.len(), 5);
        assert_eq!(snap.dimensions[&Dimension::CodeQuality].score, 45.0);
        assert_eq!(snap.dimensions[&Dimension::Testing].score, 40.0);
        assert_eq!(snap.dimensions[&Dimension::Deployment].score, 10.0);
        assert_eq!(snap.dimensions[&Dimension::Documentation].score, 20.0);
        assert_eq!(snap.dimensions[&Dimension::PrdCompliance].score, 0.0);
        // (45*25 + 40*25 + 10*20 + 20*15 + 0*15) / 100
        assert!((snap.overall_score - 26.25).abs() < 1e-9);
        assert_eq!(snap.overall_tier, Tier::Red);
        assert!(snap
            .critical_issues
            .contains(&"[testing] No backend tests found".to_string()));
        assert!(snap.warnings.is_empty());
        assert!(!snap.metadata.full_audit);
    }

    #[test]
    fn yellow_dimension_issues_become_warnings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/PRD.md", "## REQ-001 Login");
        let config = Config::default();
        let mapping = PrdMapping::NotFound;
        let snap = Auditor::new(&config, &mapping)
            .with_runner(FakeRunner::default())
            .audit(dir.path(), false)
            .unwrap();

        assert_eq!(snap.dimensions[&Dimension::PrdCompliance].tier, Tier::Yellow);
        assert_eq!(
            snap.warnings,
            vec!["[prd_compliance] PRD mapping not available"]
        );
    }

    #[test]
    fn configured_weights_drive_overall() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.scoring = DimensionMap::from([(Dimension::Deployment, 1.0)]);
        let mapping = PrdMapping::NotScanned;
        let snap = Auditor::new(&config, &mapping)
            .with_runner(FakeRunner::default())
            .audit(dir.path(), false)
            .unwrap();
        assert_eq!(snap.overall_score, 10.0);
    }
}
