//! Deployment readiness: containers, environment template, scripts, CI

use super::{AuditContext, DimensionRule};
use crate::analyzer::scoring::ScoreCard;
use crate::{Dimension, DimensionScore};
use anyhow::Result;
use serde_json::json;

/// (path, penalty, issue, recommendation)
const REQUIRED: [(&str, f64, &str, &str); 5] = [
    (
        "docker-compose.yml",
        20.0,
        "docker-compose.yml missing",
        "Create docker-compose.yml for production deployment",
    ),
    (
        "docker-compose.dev.yml",
        10.0,
        "docker-compose.dev.yml missing",
        "Create docker-compose.dev.yml for development",
    ),
    (
        "backend/Dockerfile",
        15.0,
        "Backend Dockerfile missing",
        "Create Dockerfile for backend service",
    ),
    (
        "frontend/Dockerfile",
        15.0,
        "Frontend Dockerfile missing",
        "Create Dockerfile for frontend service",
    ),
    (
        ".env.example",
        10.0,
        ".env.example missing",
        "Create .env.example with all required environment variables",
    ),
];
const MISSING_DEPLOY_SCRIPT: f64 = 10.0;
const MISSING_CI: f64 = 10.0;

pub struct DeploymentRule;

impl DimensionRule for DeploymentRule {
    fn dimension(&self) -> Dimension {
        Dimension::Deployment
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore> {
        let mut card = ScoreCard::new();

        for (path, penalty, issue, recommendation) in REQUIRED {
            if !ctx.exists(path) {
                card.deduct(penalty, issue).recommend(recommendation);
            }
        }

        let deploy_script = ctx.exists("deploy.sh") || ctx.exists("deploy.ps1");
        if !deploy_script {
            card.deduct(MISSING_DEPLOY_SCRIPT, "Deployment script missing")
                .recommend("Create deployment automation script");
        }

        let ci_cd = ctx.exists(".github/workflows");
        if !ci_cd {
            card.deduct(MISSING_CI, "CI/CD configuration missing")
                .recommend("Set up GitHub Actions for automated testing and deployment");
        }

        let details = json!({
            "docker_compose": ctx.exists("docker-compose.yml"),
            "dockerfiles": {
                "backend": ctx.exists("backend/Dockerfile"),
                "frontend": ctx.exists("frontend/Dockerfile"),
            },
            "env_example": ctx.exists(".env.example"),
            "deploy_script": deploy_script,
            "ci_cd": ci_cd,
        });
        Ok(card.finish(ctx.thresholds, details))
    }
}
