//! Workspace - the loaded state of one repository, passed to every command
//!
//! Opening a workspace creates `.guardrail/`, loads (or initialises) the
//! config and the scan memory. Each operation reads the persisted inputs it
//! needs and writes its own `latest_*.json` result.

use crate::analyzer::{Auditor, SystemRunner, ToolRunner};
use crate::config::{self, Config};
use crate::docs::{DocsAgent, DocsRun};
use crate::fixer::{FixRun, FixRunStatus, Fixer};
use crate::history::{self, History, HistoryEntry};
use crate::hook::{self, GateOutcome};
use crate::memory::{self, Memory};
use crate::report::{ReportInputs, ReportKind, WeeklyReport};
use crate::reporter::MarkdownReporter;
use crate::scanner::{BaselineScan, RepoScanner};
use crate::state::{write_json, write_text, StateDir, StateFile};
use crate::trend::{render_chart, TrendReport};
use crate::{now_timestamp, AuditSnapshot, Dimension};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const NO_AUDIT_NOTE: &str = "No audit data available";

/// Written report files
#[derive(Debug, Clone, Serialize)]
pub struct ReportFiles {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Every step result of `guardrail weekly`
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyRun {
    pub baseline: BaselineScan,
    pub audit: AuditSnapshot,
    pub trend: TrendReport,
    pub fixes: Option<FixRun>,
    pub docs: DocsRun,
    pub report: WeeklyReport,
    pub report_files: ReportFiles,
}

/// Steps `weekly` runs, in order
pub fn weekly_steps(skip_fixes: bool) -> Vec<&'static str> {
    let mut steps = vec![
        "Baseline scan (update memory)",
        "Full audit",
        "Trend analysis",
    ];
    if !skip_fixes {
        steps.push("Fix critical issues");
    }
    steps.push("Update documentation");
    steps.push("Generate weekly report");
    steps
}

pub struct Workspace {
    repo_root: PathBuf,
    state: StateDir,
    pub config: Config,
    pub memory: Memory,
    runner: Box<dyn ToolRunner>,
}

impl Workspace {
    /// Open a repository. `cli_min_score` overrides the hook minimum for this run.
    pub fn open(repo_root: &Path, cli_min_score: Option<f64>) -> Result<Self> {
        let state = StateDir::new(repo_root);
        state
            .ensure()
            .context("Failed to create the .guardrail directory")?;
        let config = config::load_or_init(&state)?.merge_with_cli(cli_min_score);
        let memory = memory::load(&state)?;

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            state,
            config,
            memory,
            runner: Box::new(SystemRunner),
        })
    }

    /// Replace the process runner used for lint, tests and fix commands
    pub fn with_runner(mut self, runner: impl ToolRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn state(&self) -> &StateDir {
        &self.state
    }

    pub fn baseline(&mut self, update_memory: bool) -> Result<BaselineScan> {
        let scan = RepoScanner::new(&self.repo_root).scan()?;
        if update_memory {
            self.memory.last_scan = Some(scan.timestamp.clone());
            self.memory.repo_structure = Some(scan.structure.clone());
            self.memory.prd_mapping = scan.prd_mapping.clone();
            memory::save(&self.state, &self.memory)?;
            info!("Memory updated");
        }
        Ok(scan)
    }

    /// Score the repository and save it as the latest audit
    pub fn audit(&self, full: bool) -> Result<AuditSnapshot> {
        let snapshot = self.run_audit(full)?;
        self.state
            .write(StateFile::LatestAudit, &snapshot)
            .context("Failed to save audit results")?;
        Ok(snapshot)
    }

    fn run_audit(&self, full: bool) -> Result<AuditSnapshot> {
        Auditor::new(&self.config, &self.memory.prd_mapping)
            .with_runner(self.runner.as_ref())
            .audit(&self.repo_root, full)
    }

    pub fn latest_audit(&self) -> Result<Option<AuditSnapshot>> {
        self.state
            .read(StateFile::LatestAudit)
            .context("Failed to load the latest audit")
    }

    pub fn history(&self) -> Result<History> {
        history::load(&self.state)
    }

    /// Overall score of the most recent history entry
    pub fn previous_overall(&self) -> Result<Option<f64>> {
        Ok(self.history()?.latest().map(|e| e.overall_score))
    }

    /// Record the latest audit in history and compare it with the previous entry
    pub fn trend(&self) -> Result<TrendReport> {
        let Some(audit) = self.latest_audit()? else {
            info!("No audit found, run `guardrail audit` first");
            return Ok(TrendReport::empty(
                now_timestamp(),
                Some(NO_AUDIT_NOTE.to_string()),
            ));
        };

        let mut history = self.history()?;
        history.append(HistoryEntry::from_snapshot(&audit));
        history::save(&self.state, &history)?;

        let report = TrendReport::from_history(now_timestamp(), &history);
        self.state
            .write(StateFile::LatestTrend, &report)
            .context("Failed to save trend results")?;
        Ok(report)
    }

    pub fn chart(&self, dimension: Option<Dimension>) -> Result<String> {
        Ok(render_chart(&self.history()?, dimension))
    }

    pub fn fix(&mut self, critical_only: bool) -> Result<FixRun> {
        let audit = self.latest_audit()?;
        let run = Fixer::new(&self.repo_root, self.runner.as_ref()).run(audit.as_ref(), critical_only);

        if run.status == FixRunStatus::Complete {
            self.memory.last_fix_run = Some(run.timestamp.clone());
            self.memory.fixes_applied = run.fixes_applied;
            memory::save(&self.state, &self.memory)?;
        }
        self.state
            .write(StateFile::LatestFixes, &run)
            .context("Failed to save fix results")?;
        Ok(run)
    }

    pub fn docs(&self) -> Result<DocsRun> {
        let run = DocsAgent::new(&self.repo_root).run()?;
        self.state
            .write(StateFile::LatestDocs, &run)
            .context("Failed to save documentation results")?;
        Ok(run)
    }

    /// Build the report from the latest persisted results and write it out
    pub fn report(&self, kind: ReportKind) -> Result<(WeeklyReport, ReportFiles)> {
        info!("Generating report...");
        let inputs = ReportInputs {
            audit: self.latest_audit()?,
            trend: self
                .state
                .read(StateFile::LatestTrend)
                .context("Failed to load the latest trend")?,
            fixes: self
                .state
                .read(StateFile::LatestFixes)
                .context("Failed to load the latest fixes")?,
            docs: self
                .state
                .read(StateFile::LatestDocs)
                .context("Failed to load the latest documentation run")?,
            thresholds: self.config.thresholds,
        };

        let now = Utc::now();
        let report = WeeklyReport::build(
            inputs,
            now,
            &self.repo_root.display().to_string(),
            kind,
        );

        let stem = report.file_stem();
        let files = ReportFiles {
            markdown: self.repo_root.join(format!("{}.md", stem)),
            json: self.repo_root.join(format!("{}.json", stem)),
        };
        let markdown =
            MarkdownReporter::render(&report, &now.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        write_text(&files.markdown, &markdown)?;
        write_json(&files.json, &report)?;
        self.state
            .write(StateFile::LatestReport, &report)
            .context("Failed to save report")?;

        info!("Report saved to {}", files.markdown.display());
        Ok((report, files))
    }

    /// Baseline, full audit, trend, fixes, docs and the weekly report in one go
    pub fn weekly(&mut self, skip_fixes: bool) -> Result<WeeklyRun> {
        info!("Starting weekly maintenance routine");
        let baseline = self.baseline(true)?;
        let audit = self.audit(true)?;
        let trend = self.trend()?;
        let fixes = if skip_fixes {
            None
        } else {
            Some(self.fix(true)?)
        };
        let docs = self.docs()?;
        let (report, report_files) = self.report(ReportKind::Weekly)?;
        info!("Weekly maintenance complete");

        Ok(WeeklyRun {
            baseline,
            audit,
            trend,
            fixes,
            docs,
            report,
            report_files,
        })
    }

    /// Enable or disable the pre-commit hook and persist the setting
    pub fn set_git_hook(&mut self, enable: bool) -> Result<()> {
        if enable {
            hook::install(&self.repo_root)?;
        } else {
            hook::uninstall(&self.repo_root)?;
        }
        self.config.git_hook.enabled = enable;
        config::save(&self.state, &self.config)
    }

    /// Quick audit for the pre-commit gate. The result is not persisted.
    pub fn git_check(&self) -> Result<(AuditSnapshot, GateOutcome)> {
        let audit = self.run_audit(false)?;
        let outcome = hook::gate(&audit, &self.config.git_hook);
        Ok((audit, outcome))
    }
}
