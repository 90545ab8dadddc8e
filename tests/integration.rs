//! Integration tests: full maintenance flows through the library API

use guardrail::analyzer::ToolRunner;
use guardrail::analyzer::tools::ToolOutput;
use guardrail::fixer::FixStatus;
use guardrail::history::{self, MAX_ENTRIES};
use guardrail::report::ReportKind;
use guardrail::scanner::PrdMapping;
use guardrail::workspace::Workspace;
use guardrail::{Dimension, Direction, Tier};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// npm stand-in: lint fails with `lint_errors` errors, tests pass with `coverage`%
#[derive(Clone, Default)]
struct CannedNpm {
    lint_errors: usize,
    coverage: f64,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ToolRunner for CannedNpm {
    fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> std::io::Result<ToolOutput> {
        let command = format!("{} {}", program, args.join(" "));
        self.calls.borrow_mut().push(command.clone());
        let output = match command.as_str() {
            "npm run lint" if self.lint_errors > 0 => ToolOutput {
                success: false,
                stdout: format!("{} problems ({} errors, 0 warnings)\n", self.lint_errors, self.lint_errors)
                    + &"  1:1  error  Unexpected var\n".repeat(self.lint_errors),
                stderr: String::new(),
            },
            "npm run test:cov" => ToolOutput {
                success: true,
                stdout: format!("All files coverage: {}%\n", self.coverage),
                stderr: String::new(),
            },
            _ => ToolOutput {
                success: true,
                ..ToolOutput::default()
            },
        };
        Ok(output)
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn node_project(root: &Path) {
    write(root, "backend/package.json", "{}");
    write(root, "frontend/package.json", "{}");
    write(root, "backend/src/users.service.ts", "/** Users */\nexport class UsersService {}\n");
    write(root, "backend/src/users.service.spec.ts", "it('creates', () => {});\n");
    write(
        root,
        "docs/PRD.md",
        "# Product\n\n## REQ-001 Users service\nPriority: P0\n\n## REQ-002 Billing invoices\nPriority: P1\n",
    );
}

#[test]
fn full_audit_runs_npm_scripts_in_each_side() {
    let dir = tempfile::tempdir().unwrap();
    node_project(dir.path());
    let npm = CannedNpm {
        lint_errors: 3,
        coverage: 62.5,
        ..CannedNpm::default()
    };
    let ws = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(npm.clone());

    let audit = ws.audit(true).unwrap();
    let calls = npm.calls.borrow();
    assert_eq!(calls.iter().filter(|c| *c == "npm run lint").count(), 2);
    assert!(calls.contains(&"npm run test:cov".to_string()));

    let testing = &audit.dimensions[&Dimension::Testing];
    assert!(testing
        .issues
        .iter()
        .any(|i| i.contains("62.5")));
    assert!(audit.metadata.full_audit);
}

#[test]
fn quick_audit_never_spawns_tools() {
    let dir = tempfile::tempdir().unwrap();
    node_project(dir.path());
    let npm = CannedNpm::default();
    let ws = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(npm.clone());

    ws.audit(false).unwrap();
    assert!(npm.calls.borrow().is_empty());
}

#[test]
fn baseline_mapping_feeds_prd_compliance() {
    let dir = tempfile::tempdir().unwrap();
    node_project(dir.path());
    let mut ws = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(CannedNpm::default());

    let unmapped = ws.audit(false).unwrap();
    assert_eq!(unmapped.dimensions[&Dimension::PrdCompliance].score, 50.0);

    let scan = ws.baseline(true).unwrap();
    match &scan.prd_mapping {
        PrdMapping::Mapped {
            total_requirements,
            implemented,
            ..
        } => {
            assert_eq!(*total_requirements, 2);
            assert_eq!(*implemented, 1);
        }
        other => panic!("expected mapping, got {:?}", other),
    }

    let reopened = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(CannedNpm::default());
    let mapped = reopened.audit(false).unwrap();
    assert_eq!(mapped.dimensions[&Dimension::PrdCompliance].score, 50.0);
    assert_eq!(
        mapped.dimensions[&Dimension::PrdCompliance].tier,
        Tier::Yellow
    );
}

#[test]
fn fix_then_audit_improves_deployment_and_trend() {
    let dir = tempfile::tempdir().unwrap();
    let mut ws = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(CannedNpm::default());

    let before = ws.audit(false).unwrap();
    ws.trend().unwrap();

    let run = ws.fix(false).unwrap();
    let created: Vec<&str> = run
        .fixes
        .iter()
        .filter(|f| f.status == FixStatus::Applied)
        .flat_map(|f| f.files_changed.iter().map(String::as_str))
        .collect();
    assert!(created.contains(&".env.example"));
    assert!(created.contains(&"README.md"));
    assert!(created.contains(&".prettierrc"));

    let after = ws.audit(false).unwrap();
    assert!(after.overall_score > before.overall_score);
    let trend = ws.trend().unwrap();
    assert_eq!(trend.metadata.history_length, 2);
    assert_eq!(trend.direction_of(Dimension::CodeQuality), Direction::Improving);
    assert!(trend.regressions.is_empty());

    let (report, files) = ws.report(ReportKind::Weekly).unwrap();
    assert!(!report.fixes_applied.is_empty());
    let md = fs::read_to_string(files.markdown).unwrap();
    assert!(md.contains("## Fixes Applied"));
    assert!(md.contains("### Improvements"));
}

#[test]
fn history_is_capped_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::open(dir.path(), None)
        .unwrap()
        .with_runner(CannedNpm::default());
    ws.audit(false).unwrap();

    for _ in 0..(MAX_ENTRIES + 3) {
        ws.trend().unwrap();
    }
    let history = history::load(ws.state()).unwrap();
    assert_eq!(history.len(), MAX_ENTRIES);
}

#[test]
fn docs_agent_syncs_env_example() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "backend/src/db.ts", "const url = process.env.DATABASE_URL;\n");
    write(dir.path(), ".env.example", "PORT=3000\n");
    let ws = Workspace::open(dir.path(), None).unwrap();

    let run = ws.docs().unwrap();
    assert!(run.files_updated.contains(&".env.example".to_string()));
    let env = fs::read_to_string(dir.path().join(".env.example")).unwrap();
    assert!(env.contains("DATABASE_URL="));
}
