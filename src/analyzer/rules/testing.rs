//! Test presence, configuration, results and coverage

use super::{AuditContext, DimensionRule};
use crate::analyzer::scoring::ScoreCard;
use crate::analyzer::tools::{run_tests, TestRunResult, ToolStatus};
use crate::scanner::{find_files, BACKEND_TESTS, FRONTEND_TESTS};
use crate::{Dimension, DimensionScore};
use anyhow::Result;
use serde_json::json;

const NO_BACKEND_TESTS: f64 = 30.0;
const NO_FRONTEND_TESTS: f64 = 20.0;
const MISSING_JEST_CONFIG: f64 = 10.0;
const FAILING_TESTS: f64 = 20.0;
const LOW_COVERAGE: f64 = 10.0;
const TESTS_NOT_RUN: f64 = 10.0;
/// Minimum acceptable backend line coverage, in percent
pub const COVERAGE_TARGET: f64 = 80.0;

pub struct TestingRule;

impl DimensionRule for TestingRule {
    fn dimension(&self) -> Dimension {
        Dimension::Testing
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore> {
        let mut card = ScoreCard::new();

        let backend_tests = find_files(&ctx.repo_root.join("backend"), BACKEND_TESTS)?;
        let frontend_tests = find_files(&ctx.repo_root.join("frontend"), FRONTEND_TESTS)?;

        if backend_tests.is_empty() {
            card.deduct(NO_BACKEND_TESTS, "No backend tests found")
                .recommend("Add unit tests for backend services and controllers");
        }
        if frontend_tests.is_empty() {
            card.deduct(NO_FRONTEND_TESTS, "No frontend tests found")
                .recommend("Add component tests for frontend");
        }
        if !ctx.exists("backend/jest.config.js") {
            card.deduct(MISSING_JEST_CONFIG, "Jest configuration missing");
        }

        let backend = if ctx.full {
            run_tests(ctx.runner, &ctx.repo_root.join("backend"))
        } else {
            TestRunResult::default()
        };

        if backend.status == ToolStatus::Failed {
            card.deduct(FAILING_TESTS, "Backend tests failing")
                .recommend("Fix failing backend tests");
        }
        if backend.status == ToolStatus::Error {
            let reason = backend.error.as_deref().unwrap_or("unknown error");
            card.deduct(
                TESTS_NOT_RUN,
                format!("Backend tests could not run: {}", reason),
            )
            .recommend("Make sure npm is installed and `npm run test:cov` works");
        }
        // Coverage only counts once the suite actually ran
        if matches!(backend.status, ToolStatus::Success | ToolStatus::Failed) {
            let coverage = backend.coverage.unwrap_or(0.0);
            if coverage < COVERAGE_TARGET {
                card.deduct(
                    LOW_COVERAGE,
                    format!("Backend test coverage low: {}%", coverage),
                )
                .recommend("Increase test coverage to at least 80%");
            }
        }

        let details = json!({
            "backend_tests": backend_tests.len(),
            "frontend_tests": frontend_tests.len(),
            "test_results": { "backend": backend },
        });
        Ok(card.finish(ctx.thresholds, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_support::{evaluate, quick, write};
    use crate::analyzer::tools::fake::FakeRunner;
    use crate::scanner::PrdMapping;
    use crate::Tier;

    fn tested_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "backend/src/user.service.spec.ts", "it()");
        write(dir.path(), "frontend/src/App.test.tsx", "it()");
        write(dir.path(), "backend/jest.config.js", "module.exports = {}");
        dir
    }

    #[test]
    fn repo_without_tests() {
        let dir = tempfile::tempdir().unwrap();
        let score = quick(&TestingRule, dir.path());
        assert_eq!(score.score, 40.0);
        assert_eq!(score.tier, Tier::Red);
        assert_eq!(
            score.issues,
            vec![
                "No backend tests found",
                "No frontend tests found",
                "Jest configuration missing"
            ]
        );
    }

    #[test]
    fn quick_audit_of_tested_repo_is_perfect() {
        let dir = tested_repo();
        let score = quick(&TestingRule, dir.path());
        assert_eq!(score.score, 100.0);
        assert_eq!(score.details["backend_tests"], 1);
    }

    #[test]
    fn failing_suite_with_low_coverage() {
        let dir = tested_repo();
        write(dir.path(), "backend/package.json", "{}");
        let runner =
            FakeRunner::default().with("run test:cov", false, "Coverage summary\nLines: 61.5%");
        let score = evaluate(&TestingRule, dir.path(), &runner, true, &PrdMapping::NotScanned);
        assert_eq!(score.score, 70.0);
        assert!(score
            .issues
            .contains(&"Backend test coverage low: 61.5%".to_string()));
    }

    #[test]
    fn passing_suite_with_good_coverage() {
        let dir = tested_repo();
        write(dir.path(), "backend/package.json", "{}");
        let runner = FakeRunner::default().with("run test:cov", true, "coverage 92%");
        let score = evaluate(&TestingRule, dir.path(), &runner, true, &PrdMapping::NotScanned);
        assert_eq!(score.score, 100.0);
        assert_eq!(score.details["test_results"]["backend"]["coverage"], 92.0);
    }

    #[test]
    fn runner_that_cannot_start_costs_points() {
        let dir = tested_repo();
        write(dir.path(), "backend/package.json", "{}");
        let runner = FakeRunner {
            fail_spawn: true,
            ..FakeRunner::default()
        };
        let score = evaluate(&TestingRule, dir.path(), &runner, true, &PrdMapping::NotScanned);
        assert_eq!(score.score, 90.0);
        assert_eq!(
            score.issues,
            vec!["Backend tests could not run: npm not installed"]
        );
        assert_eq!(score.details["test_results"]["backend"]["status"], "error");
    }
}
