//! Console reporter with colored output

use crate::docs::{DocAction, DocsRun};
use crate::fixer::{FixRun, FixRunStatus, FixStatus};
use crate::history::format_delta;
use crate::report::WeeklyReport;
use crate::scanner::{BaselineScan, PrdMapping};
use crate::trend::TrendReport;
use crate::{AuditSnapshot, Direction, Tier};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Reporter for terminal output. Renders to strings; the CLI prints them.
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show every issue
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn baseline(&self, scan: &BaselineScan) -> String {
        let mut out = String::new();
        let s = &scan.structure;
        let _ = writeln!(out, "{}", self.bold("Repository Baseline"));
        for (name, dir) in [
            ("backend", &s.backend),
            ("frontend", &s.frontend),
            ("docs", &s.docs),
            ("scripts", &s.scripts),
        ] {
            if dir.exists {
                let _ = writeln!(
                    out,
                    "   {:<9} {} files, {} lines",
                    name, dir.total_files, dir.total_lines
                );
            } else {
                let _ = writeln!(out, "   {:<9} {}", name, self.dim("missing"));
            }
        }

        let prd = match &scan.prd_mapping {
            PrdMapping::Mapped {
                total_requirements,
                implemented,
                ..
            } => format!("{}/{} requirements mapped", implemented, total_requirements),
            PrdMapping::NotFound => "PRD.md not found".to_string(),
            PrdMapping::NotScanned => "not scanned".to_string(),
        };
        let _ = writeln!(out, "   PRD:      {}", prd);
        let _ = writeln!(
            out,
            "   Totals:   {} files, {} lines, {} test files",
            scan.statistics.total_files, scan.statistics.total_lines, scan.statistics.test_files
        );

        if !scan.gaps.is_empty() {
            let _ = writeln!(out, "\n   {}", self.bold("Gaps:"));
            for gap in &scan.gaps {
                let _ = writeln!(out, "   {} {}", self.paint("✗", Tier::Red), gap.description);
            }
        }
        out
    }

    pub fn audit(&self, audit: &AuditSnapshot, previous_overall: Option<f64>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.bold("Maintainability Audit"));
        let _ = writeln!(
            out,
            "   Overall: {} {}{}",
            self.score_bar(audit.overall_score, audit.overall_tier),
            self.paint(audit.overall_tier.label(), audit.overall_tier),
            format_delta(previous_overall, audit.overall_score)
        );
        let _ = writeln!(out);

        for (dim, score) in &audit.dimensions {
            let _ = writeln!(
                out,
                "   {} {:>5.1} {:<7} {}",
                self.mini_bar(score.score),
                score.score,
                self.paint(score.tier.label(), score.tier),
                dim.title()
            );
        }

        self.issue_list(&mut out, "Critical issues:", &audit.critical_issues, Tier::Red);
        self.issue_list(&mut out, "Warnings:", &audit.warnings, Tier::Yellow);
        out
    }

    fn issue_list(&self, out: &mut String, title: &str, issues: &[String], tier: Tier) {
        if issues.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n   {}", self.bold(title));
        let shown = if self.verbose { issues.len() } else { 10 };
        for issue in issues.iter().take(shown) {
            let icon = if tier == Tier::Red { "✗" } else { "⚠" };
            let _ = writeln!(out, "   {} {}", self.paint(icon, tier), issue);
        }
        if issues.len() > shown {
            let _ = writeln!(
                out,
                "   {}",
                self.dim(&format!(
                    "{} more (use --verbose to show)",
                    issues.len() - shown
                ))
            );
        }
    }

    pub fn trend(&self, trend: &TrendReport) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}",
            self.bold("Trend:"),
            self.direction(trend.overall_trend)
        );
        if let Some(note) = &trend.metadata.note {
            let _ = writeln!(out, "   {}", self.dim(note));
            return out;
        }
        for datum in trend.trends.values() {
            let previous = datum
                .previous_score
                .map(|p| format!("{:.1}", p))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "   {:<16} {:>5} → {:>5.1} ({:+.1}) {}",
                datum.dimension.title(),
                previous,
                datum.current_score,
                datum.change,
                self.direction(datum.direction)
            );
        }
        let _ = writeln!(
            out,
            "   {} improvements, {} regressions over {} entries",
            trend.improvements.len(),
            trend.regressions.len(),
            trend.metadata.history_length
        );
        out
    }

    pub fn fixes(&self, run: &FixRun) -> String {
        let mut out = String::new();
        match run.status {
            FixRunStatus::NoAudit => {
                let _ = writeln!(out, "No audit results found. Run `guardrail audit` first.");
                return out;
            }
            FixRunStatus::NoIssues => {
                let _ = writeln!(out, "No fixable issues found.");
                return out;
            }
            FixRunStatus::Complete => {}
        }

        let _ = writeln!(out, "{}", self.bold("Fix Loop"));
        for fix in &run.fixes {
            let (icon, tier) = match fix.status {
                FixStatus::Applied => ("✓", Tier::Green),
                FixStatus::Skipped => ("-", Tier::Yellow),
                FixStatus::Failed => ("✗", Tier::Red),
            };
            let _ = writeln!(out, "   {} {}", self.paint(icon, tier), fix.issue);
            let _ = writeln!(out, "     {}", self.dim(&fix.description));
            if let Some(error) = fix.error.as_deref().filter(|e| !e.trim().is_empty()) {
                let _ = writeln!(out, "     {}", self.paint(error.trim(), Tier::Red));
            }
        }
        let _ = writeln!(
            out,
            "   {} applied, {} skipped, {} failed",
            run.fixes_applied, run.fixes_skipped, run.fixes_failed
        );
        out
    }

    pub fn docs(&self, run: &DocsRun) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.bold("Documentation"));
        if run.updates.is_empty() {
            let _ = writeln!(out, "   All documentation is up to date");
            return out;
        }
        for update in &run.updates {
            let label = match update.action {
                DocAction::Created => self.paint("created", Tier::Green),
                DocAction::Updated => self.paint("updated", Tier::Green),
                DocAction::NeedsUpdate => self.paint("needs update", Tier::Yellow),
            };
            let _ = writeln!(out, "   {} {}", update.file, label);
            for change in &update.changes {
                let _ = writeln!(out, "     → {}", change);
            }
        }
        out
    }

    pub fn report(&self, report: &WeeklyReport, markdown_file: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} Week {}",
            self.bold("Guardrail Report"),
            report.week_number
        );
        let _ = writeln!(
            out,
            "   Overall: {:.1}/100 ({})",
            report.audit.overall_score,
            self.paint(report.audit.overall_tier.label(), report.audit.overall_tier)
        );
        let _ = writeln!(out, "   Trend:   {}", self.direction(report.trend.overall_trend));
        if !report.recommendations.is_empty() {
            let _ = writeln!(out, "\n   {}", self.bold("Recommendations:"));
            for rec in &report.recommendations {
                let _ = writeln!(out, "   → {}", rec);
            }
        }
        let _ = writeln!(out, "\n   Saved {}", markdown_file);
        out
    }

    /// Message for a failed pre-commit gate
    pub fn gate_failure(&self, audit: &AuditSnapshot, min_score: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} overall score {:.1} is below the minimum {:.1}",
            self.paint("Quality gate failed:", Tier::Red),
            audit.overall_score,
            min_score
        );
        for issue in audit.critical_issues.iter().take(5) {
            let _ = writeln!(out, "   {} {}", self.paint("✗", Tier::Red), issue);
        }
        out
    }

    fn direction(&self, direction: Direction) -> ColoredString {
        let tier = match direction {
            Direction::Improving => Tier::Green,
            Direction::Stable => Tier::Yellow,
            Direction::Worsening => Tier::Red,
        };
        self.paint(&direction.to_string(), tier)
    }

    fn paint(&self, s: &str, tier: Tier) -> ColoredString {
        if !self.use_colors {
            return s.normal();
        }
        match tier {
            Tier::Green => s.green(),
            Tier::Yellow => s.yellow(),
            Tier::Red => s.red(),
        }
    }

    fn bold(&self, s: &str) -> ColoredString {
        if self.use_colors {
            s.bold()
        } else {
            s.normal()
        }
    }

    fn dim(&self, s: &str) -> ColoredString {
        if self.use_colors {
            s.dimmed()
        } else {
            s.normal()
        }
    }

    fn score_bar(&self, score: f64, tier: Tier) -> ColoredString {
        let filled = (score.clamp(0.0, 100.0) as usize * 20) / 100;
        let bar = format!(
            "[{}{}] {:>5.1}",
            "█".repeat(filled),
            "░".repeat(20 - filled),
            score
        );
        self.paint(&bar, tier)
    }

    fn mini_bar(&self, score: f64) -> String {
        let filled = (score.clamp(0.0, 100.0) as usize * 10) / 100;
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
