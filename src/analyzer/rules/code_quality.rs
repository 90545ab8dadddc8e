//! Linting, TypeScript and formatter configuration

use super::{AuditContext, DimensionRule};
use crate::analyzer::scoring::ScoreCard;
use crate::analyzer::tools::{run_lint, LintResult, ToolStatus};
use crate::{Dimension, DimensionScore};
use anyhow::Result;
use serde_json::json;

const MISSING_ESLINT: f64 = 15.0;
const MISSING_TSCONFIG: f64 = 10.0;
const PER_LINT_ERROR: f64 = 2.0;
const MAX_LINT_PENALTY: f64 = 20.0;
const MISSING_PRETTIER: f64 = 5.0;
const LINT_NOT_RUN: f64 = 5.0;

pub struct CodeQualityRule;

impl DimensionRule for CodeQualityRule {
    fn dimension(&self) -> Dimension {
        Dimension::CodeQuality
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore> {
        let mut card = ScoreCard::new();

        for (side, label) in [("backend", "Backend"), ("frontend", "Frontend")] {
            if !ctx.exists(&format!("{}/.eslintrc.js", side)) {
                card.deduct(MISSING_ESLINT, format!("{} ESLint configuration missing", label))
                    .recommend(format!("Add .eslintrc.js to {}/", side));
            }
        }
        for (side, label) in [("backend", "Backend"), ("frontend", "Frontend")] {
            if !ctx.exists(&format!("{}/tsconfig.json", side)) {
                card.deduct(
                    MISSING_TSCONFIG,
                    format!("{} TypeScript configuration missing", label),
                );
            }
        }

        let (backend, frontend) = if ctx.full {
            (
                run_lint(ctx.runner, &ctx.repo_root.join("backend")),
                run_lint(ctx.runner, &ctx.repo_root.join("frontend")),
            )
        } else {
            (LintResult::default(), LintResult::default())
        };

        for (result, label) in [(&backend, "Backend"), (&frontend, "Frontend")] {
            if result.errors > 0 {
                card.deduct_scaled(
                    result.errors,
                    PER_LINT_ERROR,
                    MAX_LINT_PENALTY,
                    format!("{} has {} linting errors", label, result.errors),
                )
                .recommend(format!(
                    "Fix {} linting errors: npm run lint -- --fix",
                    label.to_lowercase()
                ));
            }
            if result.status == ToolStatus::Error {
                let reason = result.error.as_deref().unwrap_or("unknown error");
                card.deduct(
                    LINT_NOT_RUN,
                    format!("{} lint could not run: {}", label, reason),
                )
                .recommend("Make sure npm is installed and `npm run lint` works");
            }
        }

        if !ctx.exists(".prettierrc") && !ctx.exists("prettier.config.js") {
            card.deduct(MISSING_PRETTIER, "Prettier configuration missing")
                .recommend("Add .prettierrc for consistent formatting");
        }

        let details = json!({ "backend": backend, "frontend": frontend });
        Ok(card.finish(ctx.thresholds, details))
    }
}
