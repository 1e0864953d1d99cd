//! Best-effort retrieval context over a flat document directory.
//!
//! Retrieval is never a hard dependency: a missing, empty, or unreadable
//! document root disables it for the run with a logged notice, and any
//! query-time failure degrades to an empty context string at the planner
//! boundary.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

/// Maximum number of chunks returned per query.
const TOP_K: usize = 4;

/// Seam for the document query engine, injectable in tests.
pub trait ContextProvider: Send + Sync {
    /// Return grounding text for a query. Empty string means no context.
    fn query(&self, query: &str) -> Result<String>;
}

/// One indexed paragraph chunk.
struct Chunk {
    source: String,
    text: String,
    terms: HashSet<String>,
}

/// In-memory keyword index over `.md`/`.txt` files.
pub struct RetrievalIndex {
    chunks: Vec<Chunk>,
}

impl RetrievalIndex {
    /// Build an index from every `.md`/`.txt` file directly under `dir`.
    ///
    /// Returns `None` when the directory is missing, empty, or yields no
    /// indexable text. Never errors: retrieval is best-effort by contract.
    pub fn build(dir: &Path) -> Option<Self> {
        if !dir.is_dir() {
            tracing::info!(path = %dir.display(), "document root missing, retrieval disabled");
            return None;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %dir.display(), %err, "cannot read document root, retrieval disabled");
                return None;
            }
        };

        let mut chunks = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_text = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext, "md" | "txt"))
                .unwrap_or(false);
            if !is_text {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                tracing::warn!(path = %path.display(), "skipping unreadable document");
                continue;
            };
            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            for paragraph in content.split("\n\n") {
                let text = paragraph.trim();
                if text.is_empty() {
                    continue;
                }
                chunks.push(Chunk {
                    source: source.clone(),
                    text: text.to_string(),
                    terms: tokenize(text),
                });
            }
        }

        if chunks.is_empty() {
            tracing::info!(path = %dir.display(), "no indexable documents, retrieval disabled");
            return None;
        }

        tracing::info!(path = %dir.display(), chunks = chunks.len(), "retrieval index built");
        Some(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ContextProvider for RetrievalIndex {
    fn query(&self, query: &str) -> Result<String> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Ok(String::new());
        }

        let mut scored: Vec<(usize, &Chunk)> = self
            .chunks
            .iter()
            .map(|chunk| (chunk.terms.intersection(&query_terms).count(), chunk))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let context = scored
            .iter()
            .take(TOP_K)
            .map(|(_, chunk)| format!("[{}]\n{}", chunk.source, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(context)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(|token| token.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_directory_disables_retrieval() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does_not_exist");
        assert!(RetrievalIndex::build(&missing).is_none());
    }

    #[test]
    fn empty_directory_disables_retrieval() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RetrievalIndex::build(dir.path()).is_none());
    }

    #[test]
    fn query_returns_matching_chunks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("market.md"),
            "Finland has strong agritech adoption.\n\nGermany leads industrial automation.",
        )
        .unwrap();

        let index = RetrievalIndex::build(dir.path()).unwrap();
        assert_eq!(index.len(), 2);

        let context = index.query("agritech adoption in Finland").unwrap();
        assert!(context.contains("agritech"));
        assert!(!context.contains("industrial automation"));
    }

    #[test]
    fn unrelated_query_yields_empty_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("market.md"), "Finland agritech notes.").unwrap();

        let index = RetrievalIndex::build(dir.path()).unwrap();
        let context = index.query("zzz qqq").unwrap();
        assert!(context.is_empty());
    }
}
