//! Git pre-commit hook installation and the quality gate it runs

use crate::config::GitHookConfig;
use crate::state::write_text;
use crate::AuditSnapshot;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HOOK_SCRIPT: &str = "#!/bin/sh\n\
# Installed by guardrail: blocks commits below the configured minimum score\n\
guardrail git-check --repo \"$(git rev-parse --show-toplevel)\"\n";

/// Result of checking an audit against the hook settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    /// Below the minimum, but `block_on_fail` is off
    Warn,
    Block,
}

pub fn hook_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".git").join("hooks").join("pre-commit")
}

/// Write an executable pre-commit hook. Fails outside a git repository.
pub fn install(repo_root: &Path) -> Result<PathBuf> {
    if !repo_root.join(".git").is_dir() {
        bail!("Not a git repository: {}", repo_root.display());
    }
    let path = hook_path(repo_root);
    write_text(&path, HOOK_SCRIPT)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {} executable", path.display()))?;
    }

    info!("Installed pre-commit hook at {}", path.display());
    Ok(path)
}

/// Remove the hook; `false` when there was none
pub fn uninstall(repo_root: &Path) -> Result<bool> {
    let path = hook_path(repo_root);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    info!("Removed pre-commit hook");
    Ok(true)
}

pub fn gate(audit: &AuditSnapshot, settings: &GitHookConfig) -> GateOutcome {
    if audit.overall_score >= settings.min_score {
        GateOutcome::Pass
    } else if settings.block_on_fail {
        GateOutcome::Block
    } else {
        GateOutcome::Warn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(score: f64) -> AuditSnapshot {
        AuditSnapshot {
            overall_score: score,
            ..AuditSnapshot::empty("t".to_string())
        }
    }

    #[test]
    fn install_requires_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = install(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Not a git repository"));
        assert!(!hook_path(dir.path()).exists());
    }

    #[test]
    fn install_then_uninstall() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let path = install(dir.path()).unwrap();
        let script = fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("guardrail git-check"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        assert!(uninstall(dir.path()).unwrap());
        assert!(!path.exists());
        assert!(!uninstall(dir.path()).unwrap());
    }

    #[test]
    fn gate_compares_against_min_score() {
        let settings = GitHookConfig::default();
        assert_eq!(gate(&audit(70.0), &settings), GateOutcome::Pass);
        assert_eq!(gate(&audit(69.9), &settings), GateOutcome::Block);

        let lenient = GitHookConfig {
            block_on_fail: false,
            ..GitHookConfig::default()
        };
        assert_eq!(gate(&audit(10.0), &lenient), GateOutcome::Warn);
    }
}
