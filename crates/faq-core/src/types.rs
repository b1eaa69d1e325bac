//! Core domain types for the FAQ retrieval system.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// An ordered sequence of documents produced by one retriever, best first.
pub type RankedList = Vec<Document>;

/// Content-derived document identifier (blake3 hash of the content).
///
/// Retrievers produce independent document values, so identity for
/// deduplication must come from the content rather than from the object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; 32]);

impl DocumentId {
    /// Derive the identifier for a piece of content.
    pub fn from_content(content: &str) -> Self {
        Self(*blake3::hash(content.as_bytes()).as_bytes())
    }

    /// Abbreviated hex form for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short())
    }
}

impl Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid hash length"))?;
        Ok(Self(arr))
    }
}

/// A retrievable chunk of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Chunk text content.
    pub content: String,

    /// Opaque metadata, passed through unchanged.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Content-derived identifier used for deduplication.
    pub fn id(&self) -> DocumentId {
        DocumentId::from_content(&self.content)
    }
}

/// A fused result with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Result rank (1-indexed).
    pub rank: u32,

    /// Fusion score (higher is better).
    pub score: f64,

    /// Content-derived id shared by every copy of the document.
    pub id: DocumentId,

    /// The representative document (first one seen).
    pub document: Document,
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The original query.
    pub query: String,

    /// Total fused results returned.
    pub total_results: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Fused results in score order.
    pub results: Vec<ScoredDocument>,

    /// The fused documents reordered for a long-context consumer.
    pub context: Vec<Document>,
}

impl SearchResults {
    /// Linearize the reordered documents into a single context block.
    pub fn context_block(&self) -> String {
        self.context
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_content_derived() {
        let a = Document::new("返品はできますか？").with_metadata("source", "bm25");
        let b = Document::new("返品はできますか？").with_metadata("source", "vector");
        let c = Document::new("配送料はいくらですか？");

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_id_serde_hex() {
        let id = Document::new("hello").id();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json.len(), 64 + 2);

        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<DocumentId>("\"abcd\"").is_err());
    }

    #[test]
    fn test_document_deserialize_without_metadata() {
        let doc: Document = serde_json::from_str(r#"{"content": "営業時間"}"#).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.content, "営業時間");
    }

    #[test]
    fn test_scored_document_json_carries_id() {
        let document = Document::new("送料は無料です。");
        let scored = ScoredDocument {
            rank: 1,
            score: 0.5,
            id: document.id(),
            document,
        };

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["id"], scored.id.to_string());

        let back: ScoredDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, scored.document.id());
    }

    #[test]
    fn test_context_block() {
        let results = SearchResults {
            query: "q".to_string(),
            total_results: 0,
            latency_ms: 0,
            results: Vec::new(),
            context: vec![Document::new("a"), Document::new("b")],
        };
        assert_eq!(results.context_block(), "a\n\nb");
    }
}
