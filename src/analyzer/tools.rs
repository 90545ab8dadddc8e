//! External tool invocation (npm lint and test scripts)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands. Implemented by the system runner and by test fakes.
pub trait ToolRunner {
    /// Run `program args..` in `cwd` until exit
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> std::io::Result<ToolOutput>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> std::io::Result<ToolOutput> {
        (**self).run(program, args, cwd)
    }
}

/// Spawns real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> std::io::Result<ToolOutput> {
        debug!("Running {} {} in {}", program, args.join(" "), cwd.display());
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Outcome of running one tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Skipped: quick audit or no package.json
    #[default]
    NotRun,
    Success,
    Failed,
    /// The process could not be spawned
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintResult {
    pub status: ToolStatus,
    pub errors: usize,
    /// Why the linter could not be started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRunResult {
    pub status: ToolStatus,
    /// Percentage parsed from the coverage run; absent when not measured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    /// Why the test runner could not be started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Occurrences of "error" in lowercased lint output
pub fn count_lint_errors(stdout: &str) -> usize {
    stdout.to_lowercase().matches("error").count()
}

fn coverage_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)%").expect("valid coverage regex"))
}

/// First percentage in output that mentions coverage
pub fn parse_coverage(stdout: &str) -> Option<f64> {
    if !stdout.to_lowercase().contains("coverage") {
        return None;
    }
    coverage_regex()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether npm scripts can run in `dir`
pub fn has_package_json(dir: &Path) -> bool {
    dir.join("package.json").is_file()
}

/// `npm run lint` in `dir`
pub fn run_lint(runner: &dyn ToolRunner, dir: &Path) -> LintResult {
    if !has_package_json(dir) {
        return LintResult::default();
    }
    match runner.run("npm", &["run", "lint"], dir) {
        Ok(out) => LintResult {
            status: if out.success {
                ToolStatus::Success
            } else {
                ToolStatus::Failed
            },
            errors: count_lint_errors(&out.stdout),
            error: None,
        },
        Err(e) => {
            debug!("Linting in {} failed to start: {}", dir.display(), e);
            LintResult {
                status: ToolStatus::Error,
                errors: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

/// `npm run test:cov` in `dir`
pub fn run_tests(runner: &dyn ToolRunner, dir: &Path) -> TestRunResult {
    if !has_package_json(dir) {
        return TestRunResult::default();
    }
    match runner.run("npm", &["run", "test:cov"], dir) {
        Ok(out) => TestRunResult {
            status: if out.success {
                ToolStatus::Success
            } else {
                ToolStatus::Failed
            },
            coverage: parse_coverage(&out.stdout),
            error: None,
        },
        Err(e) => {
            debug!("Tests in {} failed to start: {}", dir.display(), e);
            TestRunResult {
                status: ToolStatus::Error,
                coverage: None,
                error: Some(e.to_string()),
            }
        }
    }
}
