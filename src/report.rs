//! Weekly report - audit, trend, fixes and docs folded into one summary

use crate::docs::DocsRun;
use crate::fixer::{FixResult, FixRun};
use crate::trend::TrendReport;
use crate::config::Thresholds;
use crate::{AuditSnapshot, Tier};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_RECOMMENDATIONS: usize = 10;
const REGRESSIONS_IN_RECOMMENDATION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Weekly,
    Adhoc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub repo_path: String,
    pub report_type: ReportKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub timestamp: String,
    /// ISO week number of `timestamp`
    pub week_number: u32,
    pub audit: AuditSnapshot,
    pub trend: TrendReport,
    pub fixes_applied: Vec<FixResult>,
    pub docs_updated: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_actions: Vec<String>,
    pub metadata: ReportMetadata,
}

/// Persisted inputs of a report; any of them may be missing
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub audit: Option<AuditSnapshot>,
    pub trend: Option<TrendReport>,
    pub fixes: Option<FixRun>,
    pub docs: Option<DocsRun>,
    /// Bands the audit was classified with
    pub thresholds: Thresholds,
}

impl WeeklyReport {
    pub fn build(inputs: ReportInputs, now: DateTime<Utc>, repo_path: &str, kind: ReportKind) -> Self {
        let timestamp = now.to_rfc3339();
        let audit = inputs
            .audit
            .unwrap_or_else(|| AuditSnapshot::empty(timestamp.clone()));
        let trend = inputs
            .trend
            .unwrap_or_else(|| TrendReport::empty(timestamp.clone(), None));

        let recommendations = recommendations(&audit, &trend);
        let next_actions = next_actions(&audit, &trend, &inputs.thresholds);

        Self {
            week_number: now.iso_week().week(),
            timestamp,
            fixes_applied: inputs
                .fixes
                .map(|f| f.applied().cloned().collect())
                .unwrap_or_default(),
            docs_updated: inputs.docs.map(|d| d.files_updated).unwrap_or_default(),
            audit,
            trend,
            recommendations,
            next_actions,
            metadata: ReportMetadata {
                repo_path: repo_path.to_string(),
                report_type: kind,
            },
        }
    }

    /// Base name of the report files, e.g. `report_week_7`
    pub fn file_stem(&self) -> String {
        format!("report_week_{}", self.week_number)
    }
}

/// Prioritized recommendations, at most MAX_RECOMMENDATIONS
pub fn recommendations(audit: &AuditSnapshot, trend: &TrendReport) -> Vec<String> {
    let mut recs = Vec::new();

    if !audit.critical_issues.is_empty() {
        recs.push(format!(
            "[CRITICAL] Address {} critical issues immediately",
            audit.critical_issues.len()
        ));
    }

    for (dim, score) in &audit.dimensions {
        let fallback = match score.tier {
            Tier::Red => "Needs attention",
            Tier::Yellow => "Can be improved",
            Tier::Green => continue,
        };
        let first = score
            .recommendations
            .first()
            .map(String::as_str)
            .unwrap_or(fallback);
        recs.push(format!(
            "[{}] {}: Score {:.1} - {}",
            score.tier.label(),
            dim,
            score.score,
            first
        ));
    }

    if !trend.regressions.is_empty() {
        let shown: Vec<&str> = trend
            .regressions
            .iter()
            .take(REGRESSIONS_IN_RECOMMENDATION)
            .map(String::as_str)
            .collect();
        recs.push(format!("Investigate regressions: {}", shown.join(", ")));
    }

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

/// Checklist for the team
pub fn next_actions(audit: &AuditSnapshot, trend: &TrendReport, thresholds: &Thresholds) -> Vec<String> {
    let mut actions = Vec::new();

    let join = |dims: Vec<crate::Dimension>| {
        dims.iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let red = audit.dimensions_in(Tier::Red);
    if !red.is_empty() {
        actions.push(format!("Fix critical issues in: {}", join(red)));
    }
    let yellow = audit.dimensions_in(Tier::Yellow);
    if !yellow.is_empty() {
        actions.push(format!("Improve: {}", join(yellow)));
    }
    if !trend.regressions.is_empty() {
        actions.push("Investigate and address regressions".to_string());
    }
    if audit.overall_score < thresholds.green {
        actions.push("Schedule team review of quality issues".to_string());
    }
    actions.push("Run weekly Guardrail maintenance next week".to_string());

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixer::{FixRunStatus, FixStatus};
    use crate::history::{History, HistoryEntry};
    use crate::{Dimension, DimensionMap, DimensionScore};
    use chrono::TimeZone;

    fn dim(score: f64, recs: &[&str]) -> DimensionScore {
        DimensionScore {
            score,
            tier: Tier::from_score(score),
            issues: vec!["issue".to_string()],
            recommendations: recs.iter().map(|s| s.to_string()).collect(),
            details: serde_json::Value::Null,
        }
    }

    fn audit() -> AuditSnapshot {
        AuditSnapshot {
            overall_score: 61.0,
            overall_tier: Tier::Yellow,
            dimensions: DimensionMap::from([
                (Dimension::CodeQuality, dim(90.0, &[])),
                (Dimension::Testing, dim(40.0, &["Add unit tests"])),
                (Dimension::Deployment, dim(60.0, &[])),
            ]),
            critical_issues: vec!["[testing] issue".to_string()],
            ..AuditSnapshot::empty("t".to_string())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn missing_inputs_give_placeholder_report() {
        let report = WeeklyReport::build(ReportInputs::default(), now(), "/repo", ReportKind::Weekly);
        assert_eq!(report.week_number, 10);
        assert_eq!(report.file_stem(), "report_week_10");
        assert_eq!(report.audit.critical_issues, vec!["No audit data available"]);
        assert_eq!(report.audit.overall_tier, Tier::Red);
        assert!(report.trend.trends.is_empty());
        assert!(report.fixes_applied.is_empty());
        assert_eq!(
            report.recommendations,
            vec!["[CRITICAL] Address 1 critical issues immediately"]
        );
        assert_eq!(
            report.next_actions,
            vec![
                "Schedule team review of quality issues",
                "Run weekly Guardrail maintenance next week"
            ]
        );
    }

    #[test]
    fn recommendations_cover_red_and_yellow_dimensions() {
        let trend = TrendReport::empty("t".to_string(), None);
        let recs = recommendations(&audit(), &trend);
        assert_eq!(
            recs,
            vec![
                "[CRITICAL] Address 1 critical issues immediately",
                "[RED] testing: Score 40.0 - Add unit tests",
                "[YELLOW] deployment: Score 60.0 - Can be improved",
            ]
        );
    }

    #[test]
    fn only_first_three_regressions_are_named() {
        let mut a = audit();
        for d in Dimension::ALL {
            a.dimensions.insert(d, dim(10.0, &[]));
        }
        let mut trend = TrendReport::empty("t".to_string(), None);
        trend.regressions = (0..5).map(|i| format!("r{}", i)).collect();
        let recs = recommendations(&a, &trend);
        assert_eq!(recs.len(), 7);
        assert_eq!(recs.last().unwrap(), "Investigate regressions: r0, r1, r2");
    }

    #[test]
    fn next_actions_list_dimensions() {
        let mut trend = TrendReport::empty("t".to_string(), None);
        trend.regressions.push("testing: -10.0 points".to_string());
        let actions = next_actions(&audit(), &trend, &Thresholds::default());
        assert_eq!(
            actions,
            vec![
                "Fix critical issues in: testing",
                "Improve: deployment",
                "Investigate and address regressions",
                "Schedule team review of quality issues",
                "Run weekly Guardrail maintenance next week",
            ]
        );
    }

    #[test]
    fn team_review_follows_configured_green_band() {
        let trend = TrendReport::empty("t".to_string(), None);
        let mut a = audit();
        a.overall_score = 80.0;
        let review = "Schedule team review of quality issues".to_string();

        assert!(!next_actions(&a, &trend, &Thresholds::default()).contains(&review));
        let strict = Thresholds {
            green: 90.0,
            yellow: 60.0,
            red: 0.0,
        };
        assert!(next_actions(&a, &trend, &strict).contains(&review));
    }

    #[test]
    fn improvement_is_reported_as_improvement() {
        let mut history = History::default();
        for (ts, score) in [("t0", 40.0), ("t1", 72.0)] {
            history.append(HistoryEntry {
                timestamp: ts.to_string(),
                overall_score: score,
                dimensions: DimensionMap::from([(Dimension::Testing, score)]),
            });
        }
        let trend = TrendReport::from_history("t1".to_string(), &history);
        let inputs = ReportInputs {
            audit: Some(audit()),
            trend: Some(trend),
            ..ReportInputs::default()
        };
        let report = WeeklyReport::build(inputs, now(), "/repo", ReportKind::Weekly);
        assert_eq!(report.trend.improvements, vec!["testing: +32.0 points"]);
        assert!(report.trend.regressions.is_empty());
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Investigate regressions")));
    }

    #[test]
    fn fixes_and_docs_are_carried_over() {
        let fixes = FixRun {
            timestamp: "t".to_string(),
            status: FixRunStatus::Complete,
            total_issues: 1,
            fixes_applied: 1,
            fixes_skipped: 0,
            fixes_failed: 0,
            fixes: vec![FixResult {
                issue: "[deployment] .env.example missing".to_string(),
                status: FixStatus::Applied,
                files_changed: vec![".env.example".to_string()],
                description: "Created .env.example".to_string(),
                verification_steps: vec![],
                error: None,
            }],
        };
        let docs = DocsRun {
            timestamp: "t".to_string(),
            files_updated: vec!["QUICKSTART.md".to_string()],
            updates: vec![],
        };
        let inputs = ReportInputs {
            fixes: Some(fixes),
            docs: Some(docs),
            ..ReportInputs::default()
        };
        let report = WeeklyReport::build(inputs, now(), "/repo", ReportKind::Adhoc);
        assert_eq!(report.fixes_applied.len(), 1);
        assert_eq!(report.docs_updated, vec!["QUICKSTART.md"]);
        assert_eq!(report.metadata.report_type, ReportKind::Adhoc);
    }
}
