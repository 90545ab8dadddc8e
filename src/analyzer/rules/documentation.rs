//! Documentation completeness

use super::{AuditContext, DimensionRule};
use crate::analyzer::scoring::ScoreCard;
use crate::scanner::{find_files, read_lossy};
use crate::{Dimension, DimensionScore};
use anyhow::Result;
use serde_json::{json, Map, Value};

/// Required documents and the points each is worth
pub const REQUIRED_DOCS: [(&str, f64); 5] = [
    ("README.md", 20.0),
    ("DEPLOYMENT.md", 15.0),
    ("RUNBOOK.md", 15.0),
    ("docs/architecture.md", 10.0),
    ("docs/PRD.md", 10.0),
];
/// Documents shorter than this once trimmed count as stubs
pub const MIN_DOC_CHARS: usize = 100;
const MISSING_API_DOCS: f64 = 10.0;
const LOW_INLINE_DOCS: f64 = 10.0;
const INLINE_DOC_SAMPLE: usize = 10;

pub struct DocumentationRule;

fn is_stub(content: &str) -> bool {
    content.trim().chars().count() < MIN_DOC_CHARS
}

fn has_doc_comment(source: &str) -> bool {
    source.contains("/**") || source.contains("* @")
}

impl DimensionRule for DocumentationRule {
    fn dimension(&self) -> Dimension {
        Dimension::Documentation
    }

    fn evaluate(&self, ctx: &AuditContext<'_>) -> Result<DimensionScore> {
        let mut card = ScoreCard::new();
        let mut present = Map::new();

        for (doc, weight) in REQUIRED_DOCS {
            let path = ctx.repo_root.join(doc);
            present.insert(doc.to_string(), Value::Bool(path.exists()));
            if !path.exists() {
                card.deduct(weight, format!("{} missing", doc))
                    .recommend(format!("Create {}", doc));
            } else if is_stub(&read_lossy(&path)) {
                card.deduct(weight / 2.0, format!("{} is incomplete (too short)", doc))
                    .recommend(format!("Expand {} with more details", doc));
            }
        }

        let api_docs = find_files(&ctx.repo_root.join("docs"), &["*api*.md"])?;
        if api_docs.is_empty() {
            card.deduct(MISSING_API_DOCS, "API documentation missing")
                .recommend("Document API endpoints and schemas");
        }

        let backend_files = find_files(&ctx.repo_root.join("backend"), &["*.ts"])?;
        let sample = &backend_files[..backend_files.len().min(INLINE_DOC_SAMPLE)];
        let documented = sample
            .iter()
            .filter(|p| has_doc_comment(&read_lossy(p)))
            .count();
        if (documented as f64) < sample.len() as f64 * 0.5 {
            card.deduct(LOW_INLINE_DOCS, "Low inline code documentation")
                .recommend("Add JSDoc comments to functions and classes");
        }

        let details = json!({
            "required_docs": present,
            "api_docs": api_docs.len(),
            "documented_files": documented,
            "sampled_files": sample.len(),
        });
        Ok(card.finish(ctx.thresholds, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_support::{quick, write};

    fn long_doc() -> String {
        "Detailed documentation paragraph. ".repeat(10)
    }

    #[test]
    fn missing_everything() {
        let dir = tempfile::tempdir().unwrap();
        let score = quick(&DocumentationRule, dir.path());
        // 100 - 70 (docs) - 10 (api); no backend files sampled
        assert_eq!(score.score, 20.0);
        assert!(score.issues.contains(&"README.md missing".to_string()));
        assert!(!score
            .issues
            .contains(&"Low inline code documentation".to_string()));
    }

    #[test]
    fn stub_documents_cost_half() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# Title\n\nshort");
        for doc in ["DEPLOYMENT.md", "RUNBOOK.md", "docs/architecture.md", "docs/PRD.md"] {
            write(dir.path(), doc, &long_doc());
        }
        write(dir.path(), "docs/api-reference.md", "endpoints");

        let score = quick(&DocumentationRule, dir.path());
        assert_eq!(score.score, 90.0);
        assert_eq!(score.issues, vec!["README.md is incomplete (too short)"]);
    }

    #[test]
    fn undocumented_backend_sources() {
        let dir = tempfile::tempdir().unwrap();
        for doc in ["README.md", "DEPLOYMENT.md", "RUNBOOK.md", "docs/architecture.md", "docs/PRD.md"] {
            write(dir.path(), doc, &long_doc());
        }
        write(dir.path(), "docs/api.md", "endpoints");
        write(dir.path(), "backend/a.ts", "/** Documented */\nexport const a = 1;");
        write(dir.path(), "backend/b.ts", "export const b = 1;");
        write(dir.path(), "backend/c.ts", "export const c = 1;");

        let score = quick(&DocumentationRule, dir.path());
        assert_eq!(score.score, 90.0);
        assert_eq!(score.details["documented_files"], 1);
        assert_eq!(score.details["sampled_files"], 3);
    }

    #[test]
    fn stub_detection_trims_only_the_ends() {
        assert!(is_stub(&format!("\n\n{}\n\n\n", "a".repeat(99))));
        assert!(!is_stub(&"a".repeat(100)));
        assert!(!is_stub(&"a ".repeat(60)));
    }

    #[test]
    fn short_words_still_make_a_full_document() {
        let dir = tempfile::tempdir().unwrap();
        for doc in ["README.md", "DEPLOYMENT.md", "RUNBOOK.md", "docs/architecture.md", "docs/PRD.md"] {
            write(dir.path(), doc, &long_doc());
        }
        // 119 chars once trimmed, only 60 of them non-whitespace
        write(dir.path(), "docs/api.md", &format!("\n{}\n", "a ".repeat(60)));
        write(dir.path(), "RUNBOOK.md", &"a ".repeat(60));

        let score = quick(&DocumentationRule, dir.path());
        assert_eq!(score.score, 100.0);
        assert!(score.issues.is_empty());
    }
}
