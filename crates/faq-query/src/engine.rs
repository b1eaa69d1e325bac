//! Query engine: ensemble retrieval followed by long-context reordering.

use std::time::Instant;

use tracing::{debug, info};

use faq_core::{Document, Result, SearchResults};

use crate::ensemble::EnsembleRetriever;
use crate::reorder::long_context_reorder;

/// Produces the context handed to a downstream language model.
///
/// Runs the ensemble retriever, keeps the fused ranking, and reorders the
/// documents so the most relevant ones sit at both ends of the context.
pub struct QueryEngine {
    ensemble: EnsembleRetriever,

    /// Whether to apply long-context reordering.
    reorder: bool,
}

impl QueryEngine {
    /// Create a query engine with reordering enabled.
    pub fn new(ensemble: EnsembleRetriever) -> Self {
        Self {
            ensemble,
            reorder: true,
        }
    }

    /// Enable or disable long-context reordering.
    pub fn with_reorder(mut self, reorder: bool) -> Self {
        self.reorder = reorder;
        self
    }

    /// Retrieve, fuse, and reorder context for a query.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let start = Instant::now();

        info!("Searching for: {:?}", query);

        let results = self.ensemble.retrieve_scored(query).await?;
        debug!("Fused to {} results", results.len());

        let documents: Vec<Document> = results.iter().map(|scored| scored.document.clone()).collect();
        let context = if self.reorder {
            long_context_reorder(documents)
        } else {
            documents
        };

        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Search completed in {}ms, returned {} results",
            latency_ms,
            results.len()
        );

        Ok(SearchResults {
            query: query.to_string(),
            total_results: results.len(),
            latency_ms,
            results,
            context,
        })
    }
}
