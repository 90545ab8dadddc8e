//! Markdown rendering of the weekly report

use crate::fixer::FixStatus;
use crate::report::WeeklyReport;
use std::fmt::Write;

const WARNINGS_SHOWN: usize = 5;
const RULE: &str = "---\n\n";

/// Renders a weekly report as a markdown document
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// `generated` is the human-readable generation time shown under the title
    pub fn render(report: &WeeklyReport, generated: &str) -> String {
        let audit = &report.audit;
        let trend = &report.trend;
        let mut md = String::new();

        let _ = writeln!(md, "# Guardrail Weekly Report - Week {}\n", report.week_number);
        let _ = writeln!(md, "**Generated:** {}\n", generated);
        md.push_str(RULE);

        md.push_str("## Overall Score\n\n");
        let _ = writeln!(
            md,
            "**{:.1}/100** ({})\n",
            audit.overall_score,
            audit.overall_tier.label()
        );
        md.push_str(RULE);

        md.push_str("## Dimension Scores\n\n");
        md.push_str("| Dimension | Score | Level | Trend |\n");
        md.push_str("|-----------|-------|-------|-------|\n");
        for (dim, score) in &audit.dimensions {
            let trend_cell = match trend.trends.get(dim) {
                Some(t) => format!("{:+.1} ({})", t.change, t.direction),
                None => "N/A".to_string(),
            };
            let _ = writeln!(
                md,
                "| {} | {:.1} | {} | {} |",
                dim.title(),
                score.score,
                score.tier,
                trend_cell
            );
        }
        md.push('\n');
        md.push_str(RULE);

        if !audit.critical_issues.is_empty() {
            md.push_str("## [CRITICAL] Issues\n\n");
            bullets(&mut md, audit.critical_issues.iter());
            md.push('\n');
            md.push_str(RULE);
        }

        if !audit.warnings.is_empty() {
            md.push_str("## [WARNING] Items to Address\n\n");
            bullets(&mut md, audit.warnings.iter().take(WARNINGS_SHOWN));
            md.push('\n');
            md.push_str(RULE);
        }

        md.push_str("## Trends\n\n");
        let _ = writeln!(md, "Overall trend: **{}**\n", trend.overall_trend);
        if !trend.improvements.is_empty() {
            md.push_str("### Improvements\n\n");
            bullets(&mut md, trend.improvements.iter());
            md.push('\n');
        }
        if !trend.regressions.is_empty() {
            md.push_str("### Regressions\n\n");
            bullets(&mut md, trend.regressions.iter());
            md.push('\n');
        }
        if trend.improvements.is_empty() && trend.regressions.is_empty() {
            md.push_str(
                "No trend data available yet. Run weekly maintenance to track changes over time.\n\n",
            );
        }
        md.push_str(RULE);

        let applied: Vec<_> = report
            .fixes_applied
            .iter()
            .filter(|f| f.status == FixStatus::Applied)
            .collect();
        if !applied.is_empty() {
            md.push_str("## Fixes Applied\n\n");
            for fix in applied {
                let _ = writeln!(md, "- [APPLIED] {}", fix.issue);
                if !fix.files_changed.is_empty() {
                    let _ = writeln!(md, "  - Files: {}", fix.files_changed.join(", "));
                }
            }
            md.push('\n');
            md.push_str(RULE);
        }

        if !report.docs_updated.is_empty() {
            md.push_str("## Documentation Updated\n\n");
            bullets(&mut md, report.docs_updated.iter());
            md.push('\n');
            md.push_str(RULE);
        }

        if !report.recommendations.is_empty() {
            md.push_str("## Recommendations\n\n");
            bullets(&mut md, report.recommendations.iter());
            md.push('\n');
            md.push_str(RULE);
        }

        if !report.next_actions.is_empty() {
            md.push_str("## Next Actions\n\n");
            for action in &report.next_actions {
                let _ = writeln!(md, "- [ ] {}", action);
            }
            md.push('\n');
            md.push_str(RULE);
        }

        md.push_str("## Detailed Dimension Breakdown\n\n");
        for (dim, score) in &audit.dimensions {
            let _ = writeln!(md, "### {}\n", dim.title());
            let _ = writeln!(md, "**Score:** {:.1}/100 ({})\n", score.score, score.tier);
            if !score.issues.is_empty() {
                md.push_str("**Issues:**\n");
                bullets(&mut md, score.issues.iter());
                md.push('\n');
            }
            if !score.recommendations.is_empty() {
                md.push_str("**Recommendations:**\n");
                bullets(&mut md, score.recommendations.iter());
                md.push('\n');
            }
        }

        md
    }
}

fn bullets<'a>(md: &mut String, items: impl Iterator<Item = &'a String>) {
    for item in items {
        let _ = writeln!(md, "- {}", item);
    }
}
