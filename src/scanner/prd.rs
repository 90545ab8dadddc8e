//! Product requirements (docs/PRD.md) extraction and implementation mapping

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Related files kept per requirement
const MAX_RELATED_FILES: usize = 10;
/// Title words shorter than this are too common to count as evidence
const MIN_KEYWORD_LEN: usize = 3;

/// A requirement declared by a `## REQ-xxx Title` heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    pub priority: String,
}

/// Mapping state of one requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementStatus {
    pub title: String,
    pub priority: String,
    pub implemented: bool,
    pub files: Vec<String>,
}

/// Requirement-to-file mapping cached in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrdMapping {
    /// No baseline scan has recorded a mapping yet
    #[default]
    NotScanned,
    #[serde(rename = "prd_not_found")]
    NotFound,
    Mapped {
        total_requirements: usize,
        implemented: usize,
        mapping: BTreeMap<String, RequirementStatus>,
    },
}

impl PrdMapping {
    /// Percentage of requirements with related files, when any were declared
    pub fn implementation_rate(&self) -> Option<f64> {
        match self {
            PrdMapping::Mapped {
                total_requirements,
                implemented,
                ..
            } if *total_requirements > 0 => {
                Some(*implemented as f64 / *total_requirements as f64 * 100.0)
            }
            _ => None,
        }
    }
}

fn priority_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Priority:\s*(\S+)").expect("valid priority regex"))
}

/// Extract requirements in document order. A repeated id replaces the earlier one.
pub fn extract_requirements(content: &str) -> Vec<Requirement> {
    let mut requirements: Vec<Requirement> = Vec::new();
    let mut current: Option<usize> = None;

    for line in content.lines() {
        let heading = line
            .strip_prefix("### ")
            .or_else(|| line.strip_prefix("## "));
        if let Some(rest) = heading.filter(|r| r.starts_with("REQ-")) {
            let mut words = rest.split_whitespace();
            let id = words.next().unwrap_or_default().trim_end_matches(':').to_string();
            let title = words.collect::<Vec<_>>().join(" ");
            let requirement = Requirement {
                id,
                title,
                priority: "unknown".to_string(),
            };
            match requirements.iter().position(|r| r.id == requirement.id) {
                Some(idx) => {
                    requirements[idx] = requirement;
                    current = Some(idx);
                }
                None => {
                    requirements.push(requirement);
                    current = Some(requirements.len() - 1);
                }
            }
            continue;
        }

        if let Some(idx) = current {
            if let Some(caps) = priority_pattern().captures(line) {
                requirements[idx].priority = caps[1].to_string();
            }
        }
    }

    requirements
}

/// Map requirements to source files. `sources` holds (relative path, lowercased content).
pub fn map_requirements(requirements: &[Requirement], sources: &[(String, String)]) -> PrdMapping {
    let mut mapping = BTreeMap::new();

    for req in requirements {
        let title = req.title.to_lowercase();
        let keywords: Vec<&str> = title
            .split_whitespace()
            .filter(|w| w.len() >= MIN_KEYWORD_LEN)
            .collect();

        let files: Vec<String> = sources
            .iter()
            .filter(|(_, content)| keywords.iter().any(|k| content.contains(k)))
            .map(|(path, _)| path.clone())
            .take(MAX_RELATED_FILES)
            .collect();

        mapping.insert(
            req.id.clone(),
            RequirementStatus {
                title: req.title.clone(),
                priority: req.priority.clone(),
                implemented: !files.is_empty(),
                files,
            },
        );
    }

    let implemented = mapping.values().filter(|s| s.implemented).count();
    PrdMapping::Mapped {
        total_requirements: mapping.len(),
        implemented,
        mapping,
    }
}
