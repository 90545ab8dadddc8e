//! Guardrail: repository maintainability CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use guardrail::history::find_repo_root;
use guardrail::hook::GateOutcome;
use guardrail::report::ReportKind;
use guardrail::reporter::{ConsoleReporter, JsonReporter};
use guardrail::workspace::{weekly_steps, Workspace};
use guardrail::Dimension;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Guardrail: keeps a repository maintainable week after week
#[derive(Parser, Debug)]
#[command(name = "guardrail")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Repository root (default: nearest ancestor with .guardrail or .git)
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Verbose output and debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan repository structure, PRD mapping and gaps
    Baseline {
        /// Store the scan in .guardrail/memory.json
        #[arg(long)]
        update_memory: bool,
    },

    /// Score the repository across all quality dimensions
    Audit {
        /// Also run npm lint and test scripts
        #[arg(long)]
        full: bool,
    },

    /// Record the latest audit in history and show score changes
    Trend {
        /// Draw an ASCII chart of recent scores instead
        #[arg(long)]
        chart: bool,

        /// Dimension to chart (default: overall score)
        #[arg(requires = "chart")]
        dimension: Option<Dimension>,
    },

    /// Apply mechanical fixes for issues from the latest audit
    Fix {
        /// Only fix critical issues
        #[arg(long)]
        critical_only: bool,
    },

    /// Update the env template and check the guides
    Docs,

    /// Write the report from the latest results
    Report {
        /// Mark the report as the weekly report
        #[arg(long)]
        weekly: bool,
    },

    /// Run the full weekly maintenance routine
    Weekly {
        /// Do not apply fixes
        #[arg(long)]
        skip_fixes: bool,

        /// Only list the steps
        #[arg(long)]
        dry_run: bool,
    },

    /// Install or remove the pre-commit hook
    GitHook {
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,
    },

    /// Quick audit against the hook minimum score (exit 1 when blocked)
    GitCheck {
        /// Override git_hook.min_score from the config
        #[arg(long)]
        min_score: Option<f64>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            if args.verbose {
                eprintln!("{}: {:?}", "Error".red().bold(), e);
            } else {
                eprintln!("{}: {:#}", "Error".red().bold(), e);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(args: &Args) {
    let default = if args.json {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn resolve_repo(repo: Option<&Path>) -> Result<PathBuf> {
    match repo {
        Some(path) => path
            .canonicalize()
            .with_context(|| format!("Repository not found: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Ok(find_repo_root(&cwd).unwrap_or(cwd))
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let repo_root = resolve_repo(args.repo.as_deref())?;

    if let Commands::Weekly {
        skip_fixes,
        dry_run: true,
    } = args.command
    {
        let steps = weekly_steps(skip_fixes);
        if args.json {
            emit_json(&steps)?;
        } else {
            println!("Dry run - would execute:");
            for (i, step) in steps.iter().enumerate() {
                println!("   {}. {}", i + 1, step);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli_min_score = match args.command {
        Commands::GitCheck { min_score } => min_score,
        _ => None,
    };
    let mut ws = Workspace::open(&repo_root, cli_min_score)?;

    let mut console = ConsoleReporter::new();
    if args.verbose {
        console = console.verbose();
    }

    match &args.command {
        Commands::Baseline { update_memory } => {
            let scan = ws.baseline(*update_memory)?;
            output(args, &scan, || console.baseline(&scan))?;
        }
        Commands::Audit { full } => {
            let previous = ws.previous_overall()?;
            let audit = ws.audit(*full)?;
            output(args, &audit, || console.audit(&audit, previous))?;
        }
        Commands::Trend { chart: true, dimension } => {
            let chart = ws.chart(*dimension)?;
            if args.json {
                emit_json(&serde_json::json!({ "chart": chart }))?;
            } else {
                println!("{}", chart);
            }
        }
        Commands::Trend { chart: false, .. } => {
            let trend = ws.trend()?;
            output(args, &trend, || console.trend(&trend))?;
        }
        Commands::Fix { critical_only } => {
            let run = ws.fix(*critical_only)?;
            output(args, &run, || console.fixes(&run))?;
        }
        Commands::Docs => {
            let run = ws.docs()?;
            output(args, &run, || console.docs(&run))?;
        }
        Commands::Report { weekly } => {
            let kind = if *weekly {
                ReportKind::Weekly
            } else {
                ReportKind::Adhoc
            };
            let (report, files) = ws.report(kind)?;
            output(args, &report, || {
                console.report(&report, &files.markdown.display().to_string())
            })?;
        }
        Commands::Weekly { skip_fixes, .. } => {
            let run = ws.weekly(*skip_fixes)?;
            output(args, &run, || {
                let mut out = console.baseline(&run.baseline);
                out.push('\n');
                out.push_str(&console.audit(&run.audit, None));
                out.push('\n');
                out.push_str(&console.trend(&run.trend));
                if let Some(fixes) = &run.fixes {
                    out.push('\n');
                    out.push_str(&console.fixes(fixes));
                }
                out.push('\n');
                out.push_str(&console.docs(&run.docs));
                out.push('\n');
                out.push_str(&console.report(
                    &run.report,
                    &run.report_files.markdown.display().to_string(),
                ));
                out
            })?;
        }
        Commands::GitHook { enable, disable } => {
            if *enable || *disable {
                ws.set_git_hook(*enable)?;
            }
            let status = if ws.config.git_hook.enabled {
                "enabled"
            } else {
                "disabled"
            };
            if args.json {
                emit_json(&ws.config.git_hook)?;
            } else {
                println!(
                    "Git hook {} (min score {:.1})",
                    status, ws.config.git_hook.min_score
                );
            }
        }
        Commands::GitCheck { .. } => {
            let (audit, outcome) = ws.git_check()?;
            let min_score = ws.config.git_hook.min_score;
            if args.json {
                emit_json(&audit)?;
            } else if outcome == GateOutcome::Pass {
                println!(
                    "Quality gate passed: {:.1} (minimum {:.1})",
                    audit.overall_score, min_score
                );
            } else {
                eprint!("{}", console.gate_failure(&audit, min_score));
            }
            match outcome {
                GateOutcome::Block => return Ok(ExitCode::from(1)),
                GateOutcome::Warn => {
                    eprintln!("{}", "Commit allowed: block_on_fail is disabled".yellow());
                }
                GateOutcome::Pass => {}
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print JSON with `--json`, otherwise the console rendering
fn output<T: Serialize>(args: &Args, value: &T, console: impl FnOnce() -> String) -> Result<()> {
    if args.json {
        emit_json(value)
    } else {
        print!("{}", console());
        Ok(())
    }
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", JsonReporter::new().pretty().render(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn dimension_argument_is_parsed() {
        let args = Args::try_parse_from(["guardrail", "trend", "--chart", "testing"]).unwrap();
        match args.command {
            Commands::Trend { chart, dimension } => {
                assert!(chart);
                assert_eq!(dimension, Some(Dimension::Testing));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn enable_and_disable_conflict() {
        assert!(Args::try_parse_from(["guardrail", "git-hook", "--enable", "--disable"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from(["guardrail", "audit", "--full", "--json", "--repo", "/tmp"])
            .unwrap();
        assert!(args.json);
        assert_eq!(args.repo, Some(PathBuf::from("/tmp")));
    }
}
