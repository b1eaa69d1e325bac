//! faq-query - Rank fusion and retrieval
//!
//! This crate merges ranked lists from heterogeneous retrievers with
//! weighted Reciprocal Rank Fusion and reorders the result for consumers
//! with long contexts.
//!
//! # Features
//!
//! - Weighted Reciprocal Rank Fusion with a tunable rank-bias constant
//! - Long-context reordering (best results at both ends)
//! - BM25, vector-similarity, and query-expansion retrievers
//! - Concurrent ensemble retrieval with per-retriever timeouts
//!
//! # Example
//!
//! ```rust
//! use faq_core::Document;
//! use faq_query::{long_context_reorder, RankFusionEngine};
//!
//! let lexical = vec![Document::new("doc1"), Document::new("doc2")];
//! let vector = vec![Document::new("doc2"), Document::new("doc3")];
//!
//! let engine = RankFusionEngine::new(80.0).unwrap();
//! let fused = engine.fuse(&[(lexical, 0.4), (vector, 0.6)], Some(4)).unwrap();
//! let context = long_context_reorder(fused);
//! assert_eq!(context.len(), 3);
//! ```

mod engine;
mod ensemble;
mod fusion;
mod lexical;
mod multi_query;
mod reorder;
mod vector;

pub use engine::QueryEngine;
pub use ensemble::{EnsembleRetriever, RetrieverSet, WeightedRetriever};
pub use fusion::{weighted_reciprocal_rank_fusion, RankFusionEngine, DEFAULT_RANK_BIAS_CONSTANT};
pub use lexical::{tokenize, Bm25Retriever};
pub use multi_query::MultiQueryRetriever;
pub use reorder::long_context_reorder;
pub use vector::{cosine_similarity, VectorRetriever};

// Re-export for convenience
pub use faq_core::{Document, RankedList, ScoredDocument, SearchResults};
