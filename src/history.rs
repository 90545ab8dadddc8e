//! Score history - bounded log of audit snapshots in .guardrail/history.json

use crate::state::{StateDir, StateFile, STATE_DIRNAME};
use crate::{AuditSnapshot, DimensionMap};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// About a year of weekly runs
pub const MAX_ENTRIES: usize = 52;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub overall_score: f64,
    pub dimensions: DimensionMap<f64>,
}

impl HistoryEntry {
    pub fn from_snapshot(snapshot: &AuditSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp.clone(),
            overall_score: snapshot.overall_score,
            dimensions: snapshot.scores(),
        }
    }
}

/// Ordered oldest to newest; persisted as a plain JSON list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    pub entries: Vec<HistoryEntry>,
}

impl History {
    /// Append and evict from the front beyond MAX_ENTRIES
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES {
            self.entries.drain(0..self.entries.len() - MAX_ENTRIES);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Up to the last `n` entries, oldest first
    pub fn tail(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

/// Load history; empty when no file exists. A corrupt file is an error.
pub fn load(state: &StateDir) -> Result<History> {
    Ok(state
        .read::<History>(StateFile::History)
        .context("Failed to load score history")?
        .unwrap_or_default())
}

pub fn save(state: &StateDir, history: &History) -> Result<()> {
    state
        .write(StateFile::History, history)
        .context("Failed to save score history")
}

/// Find the repository root: nearest ancestor holding `.guardrail` or `.git`
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };

    loop {
        if dir.join(STATE_DIRNAME).is_dir() || dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Format delta for console: "[was 62.0, up 4.5]", "[was 62.0, down 3.0]" or ""
pub fn format_delta(previous: Option<f64>, current: f64) -> String {
    let Some(prev) = previous else {
        return String::new();
    };
    let diff = current - prev;
    if diff.abs() < 0.05 {
        return format!(" [unchanged at {:.1}]", current);
    }
    if diff > 0.0 {
        format!(" [was {:.1}, up {:.1}]", prev, diff)
    } else {
        format!(" [was {:.1}, down {:.1}]", prev, -diff)
    }
}
