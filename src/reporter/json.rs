//! JSON reporter for machine-readable output

use anyhow::{Context, Result};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Serialize any command result
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value).context("Failed to encode JSON output")
        } else {
            serde_json::to_string(value).context("Failed to encode JSON output")
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendReport;
    use crate::AuditSnapshot;

    #[test]
    fn test_json_output_has_expected_keys() {
        let audit = AuditSnapshot::empty("2026-01-01T00:00:00+00:00".to_string());
        let json = JsonReporter::new().render(&audit).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["overall_score"], 0.0);
        assert_eq!(parsed["overall_tier"], "red");
        assert!(parsed["dimensions"].as_object().unwrap().is_empty());
        assert_eq!(parsed["critical_issues"][0], "No audit data available");
        assert_eq!(parsed["metadata"]["full_audit"], false);
    }

    #[test]
    fn test_json_pretty_output() {
        let trend = TrendReport::empty("t".to_string(), None);
        let json = JsonReporter::new().pretty().render(&trend).unwrap();
        // Pretty JSON should have newlines and indentation
        assert!(json.contains('\n'), "pretty JSON should have newlines");
        assert!(json.contains("  \"overall_trend\": \"stable\""));
    }

    #[test]
    fn test_json_compact_output() {
        let json = JsonReporter::new().render(&vec![1, 2]).unwrap();
        assert_eq!(json, "[1,2]");
    }
}
