//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Document, RankedList};

/// Anything that produces an ordered sequence of documents for a query.
///
/// Lexical, vector, and query-expansion retrievers all sit behind this
/// trait, so fusion never depends on how relevance was computed.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Retrieve documents for a query, best first.
    async fn retrieve(&self, query: &str) -> Result<RankedList>;
}

/// Embedding model trait.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Language-model backed generator of alternative phrasings for a question.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Generate alternative queries for the question.
    async fn generate_queries(&self, question: &str) -> Result<Vec<String>>;
}

/// Parse a newline-separated model answer into queries.
///
/// Blank lines are dropped and surrounding whitespace trimmed.
pub fn parse_query_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Chunking strategy trait.
pub trait Chunker: Send + Sync {
    /// Split text content into chunk strings.
    fn split_text(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<String>>;

    /// Split a document, copying its metadata to every chunk.
    ///
    /// Each chunk also gets a `chunk_index` metadata entry.
    fn split_document(&self, document: &Document, config: &ChunkingConfig) -> Result<Vec<Document>> {
        let chunks = self.split_text(&document.content, config)?;
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), serde_json::Value::from(index));
                Document { content, metadata }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LineChunker;

    impl Chunker for LineChunker {
        fn split_text(&self, text: &str, _config: &ChunkingConfig) -> Result<Vec<String>> {
            Ok(text.lines().map(String::from).collect())
        }
    }

    #[test]
    fn test_parse_query_lines() {
        let queries = parse_query_lines("  保証期間は？\n\n延長保証について\n   \n");
        assert_eq!(queries, vec!["保証期間は？", "延長保証について"]);
    }

    #[test]
    fn test_split_document_copies_metadata() {
        let doc = Document::new("a\nb").with_metadata("source", "faq.txt");
        let chunks = LineChunker
            .split_document(&doc, &ChunkingConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "b");
        assert_eq!(chunks[1].metadata["source"], "faq.txt");
        assert_eq!(chunks[1].metadata["chunk_index"], 1);
    }
}
