//! Baseline scan - repository structure, PRD mapping, gaps and statistics

pub mod prd;

pub use prd::{extract_requirements, map_requirements, PrdMapping, Requirement, RequirementStatus};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "__pycache__", "venv", ".git"];

pub const TYPESCRIPT: &[&str] = &["*.ts", "*.tsx"];
pub const JAVASCRIPT: &[&str] = &["*.js", "*.jsx"];
pub const PYTHON: &[&str] = &["*.py"];
pub const CONFIG: &[&str] = &["*.json", "*.yaml", "*.yml"];
pub const SOURCES: &[&str] = &["*.ts", "*.tsx", "*.js", "*.jsx"];
pub const BACKEND_TESTS: &[&str] = &["*.spec.ts", "*.test.ts"];
pub const FRONTEND_TESTS: &[&str] = &["*.spec.tsx", "*.test.tsx", "*.spec.ts", "*.test.ts"];

const SCANNED_DIRS: [&str; 4] = ["backend", "frontend", "docs", "scripts"];
const STATISTIC_PATTERNS: &[&str] = &["*.ts", "*.tsx", "*.js", "*.jsx", "*.py", "*.md"];
const ROOT_CONFIG_FILES: [&str; 7] = [
    "docker-compose.yml",
    "docker-compose.dev.yml",
    ".env.example",
    "package.json",
    "README.md",
    "DEPLOYMENT.md",
    "RUNBOOK.md",
];
const CRITICAL_FILES: [(&str, &str); 4] = [
    ("README.md", "Project documentation"),
    ("DEPLOYMENT.md", "Deployment instructions"),
    (".env.example", "Environment configuration template"),
    ("docker-compose.yml", "Docker configuration"),
];

/// Build a GlobSet from file name patterns
pub fn build_pattern_set(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid file pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| anyhow::anyhow!("{}", e))
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Find files under `root` whose name matches any pattern. Missing roots yield nothing.
pub fn find_files(root: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let set = build_pattern_set(patterns)?;

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && set.is_match(e.file_name()))
        .map(|e| e.into_path())
        .collect();

    // Sort for consistent output
    files.sort();
    Ok(files)
}

/// Count lines; unreadable files count as empty
pub fn count_lines(path: &Path) -> usize {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).lines().count())
        .unwrap_or(0)
}

/// Read a file as text, replacing invalid UTF-8; unreadable files read as empty
pub fn read_lossy(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Path relative to the repository root, with forward slashes
pub fn relative(repo_root: &Path, path: &Path) -> String {
    path.strip_prefix(repo_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Files of one top-level directory grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroups {
    pub typescript: Vec<String>,
    pub javascript: Vec<String>,
    pub python: Vec<String>,
    pub config: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryScan {
    pub exists: bool,
    #[serde(default)]
    pub files: FileGroups,
    #[serde(default)]
    pub total_files: usize,
    #[serde(default)]
    pub total_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStructure {
    pub backend: DirectoryScan,
    pub frontend: DirectoryScan,
    pub docs: DirectoryScan,
    pub scripts: DirectoryScan,
    /// Presence of well-known root files
    pub config: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    MissingFile,
    MissingTests,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    High,
    Critical,
}

/// A missing piece found by the baseline scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    #[serde(rename = "type")]
    pub kind: GapKind,
    pub severity: GapSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_files: usize,
    pub total_lines: usize,
    pub backend_files: usize,
    pub frontend_files: usize,
    pub test_files: usize,
}

/// Result of `guardrail baseline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineScan {
    pub timestamp: String,
    pub structure: RepoStructure,
    pub prd_mapping: PrdMapping,
    pub gaps: Vec<Gap>,
    pub statistics: Statistics,
}

/// Scans a repository checkout
pub struct RepoScanner<'a> {
    repo_root: &'a Path,
}

impl<'a> RepoScanner<'a> {
    pub fn new(repo_root: &'a Path) -> Self {
        Self { repo_root }
    }

    /// Run every part of the baseline scan
    pub fn scan(&self) -> Result<BaselineScan> {
        info!("Scanning repository structure...");
        let result = BaselineScan {
            timestamp: crate::now_timestamp(),
            structure: self.structure()?,
            prd_mapping: self.prd_mapping()?,
            gaps: self.gaps()?,
            statistics: self.statistics()?,
        };
        info!(
            "Repository scan complete: {} files analyzed",
            result.statistics.total_files
        );
        Ok(result)
    }

    pub fn structure(&self) -> Result<RepoStructure> {
        let config = ROOT_CONFIG_FILES
            .iter()
            .map(|name| (name.to_string(), self.repo_root.join(name).exists()))
            .collect();

        Ok(RepoStructure {
            backend: self.scan_directory("backend")?,
            frontend: self.scan_directory("frontend")?,
            docs: self.scan_directory("docs")?,
            scripts: self.scan_directory("scripts")?,
            config,
        })
    }

    fn scan_directory(&self, name: &str) -> Result<DirectoryScan> {
        let dir = self.repo_root.join(name);
        if !dir.is_dir() {
            return Ok(DirectoryScan::default());
        }

        let typescript = find_files(&dir, TYPESCRIPT)?;
        let javascript = find_files(&dir, JAVASCRIPT)?;
        let python = find_files(&dir, PYTHON)?;
        let config = find_files(&dir, CONFIG)?;

        let all = [&typescript, &javascript, &python, &config];
        let total_files = all.iter().map(|v| v.len()).sum();
        let total_lines = all
            .iter()
            .flat_map(|v| v.iter())
            .map(|p| count_lines(p))
            .sum();

        let rel = |paths: &[PathBuf]| -> Vec<String> {
            paths.iter().map(|p| relative(self.repo_root, p)).collect()
        };

        Ok(DirectoryScan {
            exists: true,
            files: FileGroups {
                typescript: rel(&typescript),
                javascript: rel(&javascript),
                python: rel(&python),
                config: rel(&config),
            },
            total_files,
            total_lines,
        })
    }

    /// Map `docs/PRD.md` requirements onto backend/frontend sources
    pub fn prd_mapping(&self) -> Result<PrdMapping> {
        let prd_path = self.repo_root.join("docs").join("PRD.md");
        if !prd_path.exists() {
            warn!("PRD.md not found, skipping requirement mapping");
            return Ok(PrdMapping::NotFound);
        }

        let content = fs::read_to_string(&prd_path)
            .with_context(|| format!("Failed to read {}", prd_path.display()))?;
        let requirements = extract_requirements(&content);

        let mut sources = Vec::new();
        for side in ["backend", "frontend"] {
            for path in find_files(&self.repo_root.join(side), SOURCES)? {
                sources.push((relative(self.repo_root, &path), read_lossy(&path).to_lowercase()));
            }
        }

        Ok(map_requirements(&requirements, &sources))
    }

    pub fn gaps(&self) -> Result<Vec<Gap>> {
        let mut gaps: Vec<Gap> = CRITICAL_FILES
            .iter()
            .filter(|(file, _)| !self.repo_root.join(file).exists())
            .map(|(file, description)| Gap {
                kind: GapKind::MissingFile,
                severity: GapSeverity::High,
                file: Some(file.to_string()),
                description: format!("Missing {}", description),
            })
            .collect();

        if find_files(&self.repo_root.join("backend"), BACKEND_TESTS)?.is_empty() {
            gaps.push(Gap {
                kind: GapKind::MissingTests,
                severity: GapSeverity::Critical,
                file: None,
                description: "No backend tests found".to_string(),
            });
        }

        Ok(gaps)
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let mut total_files = 0;
        let mut total_lines = 0;
        for name in SCANNED_DIRS {
            let files = find_files(&self.repo_root.join(name), STATISTIC_PATTERNS)?;
            total_files += files.len();
            total_lines += files.iter().map(|p| count_lines(p)).sum::<usize>();
        }

        Ok(Statistics {
            total_files,
            total_lines,
            backend_files: find_files(&self.repo_root.join("backend"), &["*.ts"])?.len(),
            frontend_files: find_files(&self.repo_root.join("frontend"), TYPESCRIPT)?.len(),
            test_files: find_files(self.repo_root, BACKEND_TESTS)?.len(),
        })
    }
}
