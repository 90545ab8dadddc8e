//! Share of PRD requirements with implementing files

use super::{AuditContext, DimensionRule};
use crate::analyzer::scoring::ScoreCard;
use crate::scanner::PrdMapping;
use crate::{Dimension, DimensionScore};
use anyhow::Result;

const UNMAPPED_PENALTY: f64 = 50.0;

pub struct PrdComplianceRule;

impl DimensionRule for PrdComplianceRule {
    fn dimension(&self) -> Dimension {
        Dimension::PrdCompliance
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore> {
        let mut card = ScoreCard::new();

        if !ctx.exists("docs/PRD.md") {
            card.set_score(0.0)
                .note("PRD.md not found")
                .recommend("Create Product Requirements Document (PRD)");
            return Ok(card.finish(ctx.thresholds, serde_json::Value::Null));
        }

        match ctx.prd_mapping {
            PrdMapping::NotScanned | PrdMapping::NotFound => {
                card.deduct(UNMAPPED_PENALTY, "PRD mapping not available")
                    .recommend("Run baseline scan to map PRD requirements");
            }
            PrdMapping::Mapped {
                total_requirements,
                implemented,
                ..
            } => {
                if let Some(rate) = ctx.prd_mapping.implementation_rate() {
                    card.set_score(rate);
                    if rate < 75.0 {
                        card.note(format!(
                            "Only {}/{} requirements implemented ({:.1}%)",
                            implemented, total_requirements, rate
                        ))
                        .recommend("Implement remaining PRD requirements");
                    }
                    if rate < 50.0 {
                        card.note("Critical PRD requirements missing")
                            .recommend("Prioritize P0 and P1 requirements");
                    }
                }
            }
        }

        let details = serde_json::to_value(ctx.prd_mapping)?;
        Ok(card.finish(ctx.thresholds, details))
    }
}
