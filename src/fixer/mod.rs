//! Fix loop - maps audit issues to mechanical fixes and applies them

pub mod templates;

use crate::analyzer::tools::ToolRunner;
use crate::state::write_text;
use crate::AuditSnapshot;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// A concrete action that resolves one issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixAction {
    /// Write `content` to `path` (relative to the repository root) unless it exists
    CreateFile { path: String, content: String },
    /// Run a command in `cwd` (relative to the repository root)
    RunCommand {
        program: String,
        args: Vec<String>,
        cwd: String,
    },
}

impl FixAction {
    fn create(path: &str, content: impl Into<String>) -> Self {
        FixAction::CreateFile {
            path: path.to_string(),
            content: content.into(),
        }
    }

    fn npm(args: &[&str], cwd: &str) -> Self {
        FixAction::RunCommand {
            program: "npm".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.to_string(),
        }
    }

    fn command_line(program: &str, args: &[String]) -> String {
        std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixStatus {
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixResult {
    pub issue: String,
    pub status: FixStatus,
    #[serde(default)]
    pub files_changed: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub verification_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixRunStatus {
    /// No audit has been saved yet
    NoAudit,
    /// Nothing in the audit maps to a fix
    NoIssues,
    Complete,
}

/// Outcome of one `fix` invocation, saved as latest_fixes.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRun {
    pub timestamp: String,
    pub status: FixRunStatus,
    pub total_issues: usize,
    pub fixes_applied: usize,
    pub fixes_skipped: usize,
    pub fixes_failed: usize,
    pub fixes: Vec<FixResult>,
}

impl FixRun {
    pub fn empty(timestamp: String, status: FixRunStatus) -> Self {
        Self {
            timestamp,
            status,
            total_issues: 0,
            fixes_applied: 0,
            fixes_skipped: 0,
            fixes_failed: 0,
            fixes: Vec::new(),
        }
    }

    fn from_results(timestamp: String, fixes: Vec<FixResult>) -> Self {
        let count = |status| fixes.iter().filter(|f| f.status == status).count();
        Self {
            timestamp,
            status: FixRunStatus::Complete,
            total_issues: fixes.len(),
            fixes_applied: count(FixStatus::Applied),
            fixes_skipped: count(FixStatus::Skipped),
            fixes_failed: count(FixStatus::Failed),
            fixes,
        }
    }

    pub fn applied(&self) -> impl Iterator<Item = &FixResult> {
        self.fixes.iter().filter(|f| f.status == FixStatus::Applied)
    }
}

struct FixPatterns {
    eslint: Regex,
    prettier: Regex,
    env_example: Regex,
    readme: Regex,
    lint_errors: Regex,
    formatting: Regex,
}

fn patterns() -> &'static FixPatterns {
    static PATTERNS: OnceLock<FixPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid fix pattern");
        FixPatterns {
            eslint: re(r"(?i)\b(backend|frontend)\b.*eslint configuration missing"),
            prettier: re(r"(?i)prettier configuration missing"),
            env_example: re(r"(?i)\.env\.example missing"),
            readme: re(r"(?i)readme\.md missing"),
            lint_errors: re(r"(?i)\b(backend|frontend)\b.*linting errors"),
            formatting: re(r"(?i)formatting"),
        }
    })
}

/// Map an issue string to a fix; None when it is not mechanically fixable
pub fn fix_for_issue(issue: &str, project_name: &str) -> Option<FixAction> {
    let p = patterns();

    if let Some(caps) = p.eslint.captures(issue) {
        let side = caps[1].to_lowercase();
        return Some(FixAction::create(
            &format!("{}/.eslintrc.js", side),
            templates::ESLINT_CONFIG,
        ));
    }
    if p.prettier.is_match(issue) {
        return Some(FixAction::create(".prettierrc", templates::PRETTIER_CONFIG));
    }
    if p.env_example.is_match(issue) {
        return Some(FixAction::create(".env.example", templates::ENV_EXAMPLE));
    }
    if p.readme.is_match(issue) {
        return Some(FixAction::create("README.md", templates::readme(project_name)));
    }
    if let Some(caps) = p.lint_errors.captures(issue) {
        let side = caps[1].to_lowercase();
        return Some(FixAction::npm(&["run", "lint", "--", "--fix"], &side));
    }
    if p.formatting.is_match(issue) {
        return Some(FixAction::npm(&["run", "format"], "."));
    }
    None
}

/// Applies fixes inside one repository
pub struct Fixer<'a> {
    repo_root: &'a Path,
    runner: &'a dyn ToolRunner,
}

impl<'a> Fixer<'a> {
    pub fn new(repo_root: &'a Path, runner: &'a dyn ToolRunner) -> Self {
        Self { repo_root, runner }
    }

    fn project_name(&self) -> String {
        self.repo_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Project".to_string())
    }

    /// Run the fix loop over an audit's critical issues (and warnings unless `critical_only`)
    pub fn run(&self, audit: Option<&AuditSnapshot>, critical_only: bool) -> FixRun {
        info!("Starting fix loop...");
        let timestamp = crate::now_timestamp();

        let Some(audit) = audit else {
            warn!("No audit results found, run audit first");
            return FixRun::empty(timestamp, FixRunStatus::NoAudit);
        };

        let mut issues: Vec<&String> = audit.critical_issues.iter().collect();
        if !critical_only {
            issues.extend(audit.warnings.iter());
        }

        let name = self.project_name();
        let actions: Vec<(&String, FixAction)> = issues
            .into_iter()
            .filter_map(|issue| fix_for_issue(issue, &name).map(|action| (issue, action)))
            .collect();

        if actions.is_empty() {
            info!("No fixable issues found");
            return FixRun::empty(timestamp, FixRunStatus::NoIssues);
        }
        info!("Found {} fixable issues", actions.len());

        let fixes = actions
            .into_iter()
            .map(|(issue, action)| {
                let result = self.apply(issue, &action);
                match result.status {
                    FixStatus::Applied => info!("  Fixed: {}", issue),
                    FixStatus::Skipped => info!("  Skipped: {}", issue),
                    FixStatus::Failed => warn!("  Failed: {}", issue),
                }
                result
            })
            .collect();

        FixRun::from_results(timestamp, fixes)
    }

    /// Apply one action; failures are captured in the result
    pub fn apply(&self, issue: &str, action: &FixAction) -> FixResult {
        match action {
            FixAction::CreateFile { path, content } => self.create_file(issue, path, content),
            FixAction::RunCommand { program, args, cwd } => {
                self.run_command(issue, program, args, cwd)
            }
        }
    }

    fn create_file(&self, issue: &str, rel: &str, content: &str) -> FixResult {
        let path = self.repo_root.join(rel);
        if path.exists() {
            return FixResult {
                issue: issue.to_string(),
                status: FixStatus::Skipped,
                files_changed: Vec::new(),
                description: "File already exists".to_string(),
                verification_steps: Vec::new(),
                error: None,
            };
        }

        match write_text(&path, content) {
            Ok(()) => FixResult {
                issue: issue.to_string(),
                status: FixStatus::Applied,
                files_changed: vec![rel.to_string()],
                description: format!("Created {}", rel),
                verification_steps: vec![
                    format!("Verify {} exists", rel),
                    format!("Review {} content", rel),
                ],
                error: None,
            },
            Err(e) => FixResult {
                issue: issue.to_string(),
                status: FixStatus::Failed,
                files_changed: Vec::new(),
                description: format!("Could not create {}", rel),
                verification_steps: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    fn run_command(&self, issue: &str, program: &str, args: &[String], cwd: &str) -> FixResult {
        let dir = if cwd == "." {
            self.repo_root.to_path_buf()
        } else {
            self.repo_root.join(cwd)
        };
        let line = FixAction::command_line(program, args);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.runner.run(program, &arg_refs, &dir) {
            Ok(out) if out.success => FixResult {
                issue: issue.to_string(),
                status: FixStatus::Applied,
                files_changed: Vec::new(),
                description: format!("Ran: {}", line),
                verification_steps: vec![
                    "Run tests to verify no breakage".to_string(),
                    "Review changed files".to_string(),
                ],
                error: None,
            },
            Ok(out) => FixResult {
                issue: issue.to_string(),
                status: FixStatus::Failed,
                files_changed: Vec::new(),
                description: format!("Command failed: {}", line),
                verification_steps: Vec::new(),
                error: Some(out.stderr),
            },
            Err(e) => FixResult {
                issue: issue.to_string(),
                status: FixStatus::Failed,
                files_changed: Vec::new(),
                description: format!("Command failed: {}", line),
                verification_steps: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tools::fake::FakeRunner;
    use std::fs;

    fn audit(critical: &[&str], warnings: &[&str]) -> AuditSnapshot {
        AuditSnapshot {
            critical_issues: critical.iter().map(|s| s.to_string()).collect(),
            warnings: warnings.iter().map(|s| s.to_string()).collect(),
            ..AuditSnapshot::empty("t".to_string())
        }
    }

    #[test]
    fn maps_known_issues() {
        assert_eq!(
            fix_for_issue("[code_quality] Backend ESLint configuration missing", "app"),
            Some(FixAction::create("backend/.eslintrc.js", templates::ESLINT_CONFIG))
        );
        assert_eq!(
            fix_for_issue("[code_quality] Frontend has 12 linting errors", "app"),
            Some(FixAction::npm(&["run", "lint", "--", "--fix"], "frontend"))
        );
        assert!(matches!(
            fix_for_issue("[deployment] .env.example missing", "app"),
            Some(FixAction::CreateFile { ref path, .. }) if path == ".env.example"
        ));
        assert!(matches!(
            fix_for_issue("[documentation] README.md missing", "app"),
            Some(FixAction::CreateFile { ref path, .. }) if path == "README.md"
        ));
        assert_eq!(fix_for_issue("[testing] No backend tests found", "app"), None);
        assert_eq!(
            fix_for_issue("[documentation] README.md is incomplete (too short)", "app"),
            None
        );
    }

    #[test]
    fn no_audit_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let run = Fixer::new(dir.path(), &runner).run(None, true);
        assert_eq!(run.status, FixRunStatus::NoAudit);
        assert!(run.fixes.is_empty());
    }

    #[test]
    fn no_fixable_issues_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let a = audit(&["[testing] No backend tests found"], &[]);
        let run = Fixer::new(dir.path(), &runner).run(Some(&a), true);
        assert_eq!(run.status, FixRunStatus::NoIssues);
    }

    #[test]
    fn creates_missing_files_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".prettierrc"), "{}").unwrap();
        let runner = FakeRunner::default();
        let a = audit(
            &[
                "[code_quality] Backend ESLint configuration missing",
                "[code_quality] Prettier configuration missing",
            ],
            &[],
        );

        let run = Fixer::new(dir.path(), &runner).run(Some(&a), true);
        assert_eq!(run.status, FixRunStatus::Complete);
        assert_eq!(run.total_issues, 2);
        assert_eq!(run.fixes_applied, 1);
        assert_eq!(run.fixes_skipped, 1);
        assert_eq!(run.fixes[0].files_changed, vec!["backend/.eslintrc.js"]);
        assert!(dir.path().join("backend/.eslintrc.js").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join(".prettierrc")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn critical_only_ignores_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let a = audit(&[], &["[deployment] .env.example missing"]);

        let run = Fixer::new(dir.path(), &runner).run(Some(&a), true);
        assert_eq!(run.status, FixRunStatus::NoIssues);

        let run = Fixer::new(dir.path(), &runner).run(Some(&a), false);
        assert_eq!(run.fixes_applied, 1);
        assert!(dir.path().join(".env.example").exists());
    }

    #[test]
    fn command_fix_runs_in_side_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default().with("run lint -- --fix", false, "");
        let a = audit(&["[code_quality] Backend has 4 linting errors"], &[]);

        let run = Fixer::new(dir.path(), &runner).run(Some(&a), true);
        assert_eq!(run.fixes_failed, 1);
        assert_eq!(run.fixes[0].description, "Command failed: npm run lint -- --fix");
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].0, "npm run lint -- --fix");
        assert_eq!(calls[0].1, dir.path().join("backend"));
    }
}
