//! Knowledge retrieval tool.
//!
//! Retrieval is behind a trait so the corpus backend can be swapped: the
//! in-process keyword index here, or a vector store in a larger
//! deployment. The tool renders the top chunks as a numbered context
//! block the engine can quote from.

use async_trait::async_trait;
use serde::Serialize;
use toolrun_core::Tool;
use toolrun_core::error::ToolError;

/// A scored chunk of corpus text.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub source: String,
    pub content: String,
    pub score: f64,
}

/// A searchable document corpus.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk>;
}

/// An in-process keyword index over (source, text) documents.
///
/// Scores by the fraction of query terms a document contains, with a
/// small bonus per extra occurrence. Crude, but deterministic and good
/// enough for corpora that fit in memory.
pub struct KeywordIndex {
    documents: Vec<(String, String)>,
}

impl KeywordIndex {
    pub fn new(documents: Vec<(String, String)>) -> Self {
        Self { documents }
    }

    fn score(query_terms: &[String], text: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let haystack = text.to_lowercase();
        let mut matched = 0usize;
        let mut occurrences = 0usize;
        for term in query_terms {
            let count = haystack.matches(term.as_str()).count();
            if count > 0 {
                matched += 1;
                occurrences += count - 1;
            }
        }
        matched as f64 / query_terms.len() as f64 + 0.01 * occurrences as f64
    }
}

#[async_trait]
impl RetrievalService for KeywordIndex {
    async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .map(String::from)
            .collect();

        let mut scored: Vec<RetrievedChunk> = self
            .documents
            .iter()
            .map(|(source, content)| RetrievedChunk {
                source: source.clone(),
                content: content.clone(),
                score: Self::score(&terms, content),
            })
            .filter(|c| c.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// The tool wrapper around a [`RetrievalService`].
pub struct RetrievalTool {
    service: std::sync::Arc<dyn RetrievalService>,
}

impl RetrievalTool {
    pub fn new(service: std::sync::Arc<dyn RetrievalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &str {
        "retrieval"
    }

    fn description(&self) -> &str {
        "Search the knowledge corpus for passages relevant to a query. Returns the best-matching chunks with their sources."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Maximum number of chunks to return (default 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let top_k = arguments["top_k"].as_u64().unwrap_or(3).min(10) as usize;

        let chunks = self.service.search(query, top_k).await;
        if chunks.is_empty() {
            return Ok("No relevant passages found.".into());
        }

        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            out.push_str(&format!("[{}] ({}) {}", i + 1, chunk.source, chunk.content));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample_index() -> KeywordIndex {
        KeywordIndex::new(vec![
            (
                "ownership.md".into(),
                "Ownership rules ensure each value has a single owner; borrowing lends access without transfer.".into(),
            ),
            (
                "shipping.md".into(),
                "Standard shipping takes five business days. Express shipping arrives in two.".into(),
            ),
            (
                "returns.md".into(),
                "Items may be returned within thirty days of delivery for a full refund.".into(),
            ),
        ])
    }

    #[tokio::test]
    async fn ranks_matching_document_first() {
        let index = sample_index();
        let results = index.search("how long does shipping take", 3).await;
        assert!(!results.is_empty());
        assert_eq!(results[0].source, "shipping.md");
    }

    #[tokio::test]
    async fn respects_top_k() {
        let index = KeywordIndex::new(vec![
            ("a.md".into(), "alpha topic".into()),
            ("b.md".into(), "alpha subject".into()),
            ("c.md".into(), "alpha matter".into()),
        ]);
        let results = index.search("alpha", 2).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn unmatched_query_is_empty() {
        let index = sample_index();
        let results = index.search("quantum chromodynamics", 3).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn tool_renders_numbered_chunks() {
        let tool = RetrievalTool::new(Arc::new(sample_index()));
        let out = tool
            .call(serde_json::json!({"query": "return refund policy"}))
            .await
            .unwrap();
        assert!(out.starts_with("[1] (returns.md)"));
    }

    #[tokio::test]
    async fn tool_reports_no_matches() {
        let tool = RetrievalTool::new(Arc::new(sample_index()));
        let out = tool
            .call(serde_json::json!({"query": "zzzz"}))
            .await
            .unwrap();
        assert_eq!(out, "No relevant passages found.");
    }

    #[tokio::test]
    async fn tool_missing_query_is_invalid() {
        let tool = RetrievalTool::new(Arc::new(sample_index()));
        let result = tool.call(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
