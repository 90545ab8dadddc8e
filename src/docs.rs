//! Documentation agent - keeps env template and guides in step with the code

use crate::fixer::templates;
use crate::scanner::{find_files, read_lossy};
use crate::state::write_text;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

const README_SECTIONS: [(&str, &str); 2] = [
    ("## Quick Start", "Add Quick Start section"),
    ("## Documentation", "Add Documentation section"),
];
const RUNBOOK_SECTIONS: [&str; 4] = [
    "## Monitoring",
    "## Troubleshooting",
    "## Backup",
    "## Recovery",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocAction {
    Created,
    Updated,
    /// Reported only; the file was not modified
    NeedsUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocUpdate {
    pub file: String,
    pub action: DocAction,
    pub changes: Vec<String>,
}

impl DocUpdate {
    fn new(file: &str, action: DocAction, changes: Vec<String>) -> Self {
        Self {
            file: file.to_string(),
            action,
            changes,
        }
    }

    pub fn wrote_file(&self) -> bool {
        matches!(self.action, DocAction::Created | DocAction::Updated)
    }
}

/// Result of `guardrail docs`, saved as latest_docs.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsRun {
    pub timestamp: String,
    /// Files actually written
    pub files_updated: Vec<String>,
    pub updates: Vec<DocUpdate>,
}

fn env_var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"process\.env\.(\w+)").expect("valid env var regex"))
}

/// `process.env.X` names used in backend TypeScript, sorted
pub fn env_vars_in_backend(repo_root: &Path) -> Result<BTreeSet<String>> {
    let mut vars = BTreeSet::new();
    for path in find_files(&repo_root.join("backend"), &["*.ts"])? {
        let source = read_lossy(&path);
        vars.extend(
            env_var_pattern()
                .captures_iter(&source)
                .map(|caps| caps[1].to_string()),
        );
    }
    Ok(vars)
}

/// Keys declared as `KEY=...` in an env file
fn declared_keys(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

pub struct DocsAgent<'a> {
    repo_root: &'a Path,
}

impl<'a> DocsAgent<'a> {
    pub fn new(repo_root: &'a Path) -> Self {
        Self { repo_root }
    }

    pub fn run(&self) -> Result<DocsRun> {
        info!("Updating documentation...");

        let updates: Vec<DocUpdate> = [
            self.update_env_example()?,
            self.check_readme()?,
            self.check_deployment()?,
            self.check_runbook()?,
            self.ensure_quickstart()?,
        ]
        .into_iter()
        .flatten()
        .collect();

        let files_updated: Vec<String> = updates
            .iter()
            .filter(|u| u.wrote_file())
            .map(|u| u.file.clone())
            .collect();
        info!("Documentation updated: {} files", files_updated.len());

        Ok(DocsRun {
            timestamp: crate::now_timestamp(),
            files_updated,
            updates,
        })
    }

    fn read(&self, rel: &str) -> Result<Option<String>> {
        let path = self.repo_root.join(rel);
        if !path.exists() {
            info!("  {} not found, skipping", rel);
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Append env vars used by the backend but absent from `.env.example`
    pub fn update_env_example(&self) -> Result<Option<DocUpdate>> {
        let used = env_vars_in_backend(self.repo_root)?;
        if used.is_empty() {
            info!("  No environment variables found to update");
            return Ok(None);
        }
        let Some(current) = self.read(".env.example")? else {
            return Ok(None);
        };

        let declared = declared_keys(&current);
        let missing: Vec<&String> = used.difference(&declared).collect();
        if missing.is_empty() {
            info!("  .env.example is up to date");
            return Ok(None);
        }

        let mut content = current.trim_end().to_string();
        content.push_str("\n\n# Additional variables\n");
        for var in &missing {
            content.push_str(var);
            content.push_str("=\n");
        }
        write_text(&self.repo_root.join(".env.example"), &content)?;

        Ok(Some(DocUpdate::new(
            ".env.example",
            DocAction::Updated,
            vec![format!("Added {} missing variables", missing.len())],
        )))
    }

    pub fn check_readme(&self) -> Result<Option<DocUpdate>> {
        let Some(content) = self.read("README.md")? else {
            return Ok(None);
        };
        let changes: Vec<String> = README_SECTIONS
            .iter()
            .filter(|(heading, _)| !content.contains(heading))
            .map(|(_, change)| change.to_string())
            .collect();

        if changes.is_empty() {
            info!("  README.md is up to date");
            return Ok(None);
        }
        info!("  README.md needs updates: {}", changes.join(", "));
        Ok(Some(DocUpdate::new("README.md", DocAction::NeedsUpdate, changes)))
    }

    pub fn check_deployment(&self) -> Result<Option<DocUpdate>> {
        if !self.repo_root.join("docker-compose.yml").exists() {
            return Ok(None);
        }
        let Some(content) = self.read("DEPLOYMENT.md")? else {
            return Ok(None);
        };
        if content.to_lowercase().contains("docker") {
            info!("  DEPLOYMENT.md is up to date");
            return Ok(None);
        }
        Ok(Some(DocUpdate::new(
            "DEPLOYMENT.md",
            DocAction::NeedsUpdate,
            vec!["Add Docker deployment instructions".to_string()],
        )))
    }

    pub fn check_runbook(&self) -> Result<Option<DocUpdate>> {
        let Some(content) = self.read("RUNBOOK.md")? else {
            return Ok(None);
        };
        let changes: Vec<String> = RUNBOOK_SECTIONS
            .iter()
            .filter(|heading| !content.contains(*heading))
            .map(|heading| format!("Add {} section", heading.trim_start_matches("## ")))
            .collect();

        if changes.is_empty() {
            info!("  RUNBOOK.md is up to date");
            return Ok(None);
        }
        Ok(Some(DocUpdate::new("RUNBOOK.md", DocAction::NeedsUpdate, changes)))
    }

    /// Create QUICKSTART.md when absent
    pub fn ensure_quickstart(&self) -> Result<Option<DocUpdate>> {
        let path = self.repo_root.join("QUICKSTART.md");
        if path.exists() {
            return Ok(None);
        }
        let name = self
            .repo_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Project".to_string());
        write_text(&path, &templates::quickstart(&name))?;
        info!("  Created QUICKSTART.md");

        Ok(Some(DocUpdate::new(
            "QUICKSTART.md",
            DocAction::Created,
            vec!["Created quick start guide".to_string()],
        )))
    }
}
