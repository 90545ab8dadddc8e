//! State directory - flat JSON files under `.guardrail/` at the repository root.
//!
//! Every file is fully read and fully rewritten. Writes go to a sibling
//! temporary file first and are renamed into place, so a killed run leaves
//! either the old or the new content. There is no locking: a single writer per
//! repository is assumed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STATE_DIRNAME: &str = ".guardrail";

/// Errors reading or writing persisted state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt state file {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Known files inside the state directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFile {
    Config,
    Memory,
    History,
    LatestAudit,
    LatestTrend,
    LatestFixes,
    LatestDocs,
    LatestReport,
}

impl StateFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            StateFile::Config => "config.json",
            StateFile::Memory => "memory.json",
            StateFile::History => "history.json",
            StateFile::LatestAudit => "latest_audit.json",
            StateFile::LatestTrend => "latest_trend.json",
            StateFile::LatestFixes => "latest_fixes.json",
            StateFile::LatestDocs => "latest_docs.json",
            StateFile::LatestReport => "latest_report.json",
        }
    }
}

/// Handle on `<repo>/.guardrail`
#[derive(Debug, Clone)]
pub struct StateDir {
    dir: PathBuf,
}

impl StateDir {
    pub fn new(repo_root: &Path) -> Self {
        Self {
            dir: repo_root.join(STATE_DIRNAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if missing
    pub fn ensure(&self) -> Result<(), StateError> {
        fs::create_dir_all(&self.dir).map_err(|source| StateError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn file(&self, file: StateFile) -> PathBuf {
        self.dir.join(file.file_name())
    }

    /// Read a state file; `Ok(None)` when it does not exist yet
    pub fn read<T: DeserializeOwned>(&self, file: StateFile) -> Result<Option<T>, StateError> {
        read_json(&self.file(file))
    }

    /// Overwrite a state file
    pub fn write<T: Serialize>(&self, file: StateFile, value: &T) -> Result<(), StateError> {
        write_json(&self.file(file), value)
    }
}

/// Read and decode a JSON file; `Ok(None)` when it does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StateError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StateError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StateError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Encode as pretty JSON and write atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StateError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &content)
}

/// Write text atomically (temporary sibling, then rename)
pub fn write_text(path: &Path, content: &str) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: f64,
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        let loaded: Option<Sample> = state.read(StateFile::LatestAudit).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn write_then_read_roundtrip_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        let sample = Sample {
            name: "audit".to_string(),
            value: 71.25,
        };
        state.write(StateFile::LatestAudit, &sample).unwrap();

        assert!(dir.path().join(".guardrail/latest_audit.json").exists());
        assert!(!dir.path().join(".guardrail/latest_audit.json.tmp").exists());
        let loaded: Sample = state.read(StateFile::LatestAudit).unwrap().unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn corrupt_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        state.ensure().unwrap();
        fs::write(state.file(StateFile::History), "[{ not json").unwrap();

        let err = state.read::<Vec<Sample>>(StateFile::History).unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
        assert!(err.to_string().contains("history.json"));
    }

    #[test]
    fn error_chain_names_the_cause_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        state.ensure().unwrap();
        fs::write(state.file(StateFile::History), "[{ not json").unwrap();

        let err = state.read::<Vec<Sample>>(StateFile::History).unwrap_err();
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(!err.to_string().contains(&cause));

        let chain = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chain.matches(&cause).count(), 1);
        assert!(chain.starts_with("corrupt state file "));
    }

    #[test]
    fn write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        write_json(&path, &vec![4]).unwrap();
        let loaded: Vec<i32> = read_json(&path).unwrap().unwrap();
        assert_eq!(loaded, vec![4]);
    }
}
