//! Scan memory - cached repository understanding in `.guardrail/memory.json`

use crate::scanner::{PrdMapping, RepoStructure};
use crate::state::{StateDir, StateError, StateFile};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Memory {
    pub last_scan: Option<String>,
    pub repo_structure: Option<RepoStructure>,
    pub prd_mapping: PrdMapping,
    pub last_fix_run: Option<String>,
    pub fixes_applied: usize,
}

/// Load memory. It is rebuilt by every baseline scan, so a corrupt file is
/// reported and replaced by an empty memory instead of failing the run.
pub fn load(state: &StateDir) -> Result<Memory> {
    match state.read::<Memory>(StateFile::Memory) {
        Ok(memory) => Ok(memory.unwrap_or_default()),
        Err(StateError::Corrupt { path, source }) => {
            warn!(
                "Ignoring corrupt {} ({}); run `guardrail baseline --update-memory` to rebuild it",
                path.display(),
                source
            );
            Ok(Memory::default())
        }
        Err(e) => Err(e).context("Failed to load scan memory"),
    }
}

pub fn save(state: &StateDir, memory: &Memory) -> Result<()> {
    state
        .write(StateFile::Memory, memory)
        .context("Failed to save scan memory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_memory_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let memory = load(&StateDir::new(dir.path())).unwrap();
        assert_eq!(memory, Memory::default());
        assert_eq!(memory.prd_mapping, PrdMapping::NotScanned);
    }

    #[test]
    fn corrupt_memory_resets_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        state.ensure().unwrap();
        fs::write(state.file(StateFile::Memory), "{\"last_scan\": ").unwrap();

        let memory = load(&state).unwrap();
        assert_eq!(memory, Memory::default());
    }

    #[test]
    fn unknown_fields_from_older_files_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        state.ensure().unwrap();
        fs::write(
            state.file(StateFile::Memory),
            r#"{"last_scan": "t", "known_issues": ["stale"], "fixes_applied": 2}"#,
        )
        .unwrap();

        let memory = load(&state).unwrap();
        assert_eq!(memory.fixes_applied, 2);
        save(&state, &memory).unwrap();
        let written = fs::read_to_string(state.file(StateFile::Memory)).unwrap();
        assert!(!written.contains("known_issues"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path());
        let memory = Memory {
            last_scan: Some("2026-03-02T10:00:00+00:00".to_string()),
            prd_mapping: PrdMapping::NotFound,
            fixes_applied: 3,
            ..Memory::default()
        };
        save(&state, &memory).unwrap();
        assert_eq!(load(&state).unwrap(), memory);
    }
}
