//! Weighted ensemble of heterogeneous retrievers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use faq_core::{
    validate_weights, EnsembleConfig, FaqError, RankedList, Result, Retriever, ScoredDocument,
};

use crate::fusion::RankFusionEngine;

/// A retriever paired with its fusion weight.
#[derive(Clone)]
pub struct WeightedRetriever {
    /// The retriever.
    pub retriever: Arc<dyn Retriever>,

    /// Non-negative fusion weight.
    pub weight: f64,
}

impl WeightedRetriever {
    /// Pair a retriever with a weight.
    pub fn new(retriever: Arc<dyn Retriever>, weight: f64) -> Self {
        Self { retriever, weight }
    }
}

/// Optional retriever backends, one per configured weight.
///
/// Backends that are not available are left as `None` and skipped.
#[derive(Default, Clone)]
pub struct RetrieverSet {
    /// Term-based retriever (BM25).
    pub lexical: Option<Arc<dyn Retriever>>,

    /// Embedding-similarity retriever.
    pub vector: Option<Arc<dyn Retriever>>,

    /// Query-expansion retriever.
    pub multi_query: Option<Arc<dyn Retriever>>,
}

/// Retriever that queries several retrievers concurrently and fuses their
/// ranked lists with weighted reciprocal rank fusion.
pub struct EnsembleRetriever {
    retrievers: Vec<WeightedRetriever>,
    fusion: RankFusionEngine,
    limit: Option<usize>,
    timeout: Option<Duration>,
}

impl EnsembleRetriever {
    /// Create an ensemble, validating weights and the rank-bias constant.
    ///
    /// Weights must be finite and non-negative with a positive sum.
    pub fn new(retrievers: Vec<WeightedRetriever>, rank_bias_constant: f64) -> Result<Self> {
        if retrievers.is_empty() {
            return Err(FaqError::config("ensemble needs at least one retriever"));
        }

        let named: Vec<(&str, f64)> = retrievers
            .iter()
            .map(|r| (r.retriever.name(), r.weight))
            .collect();
        validate_weights(&named)?;

        Ok(Self {
            fusion: RankFusionEngine::new(rank_bias_constant)?,
            retrievers,
            limit: None,
            timeout: None,
        })
    }

    /// Build an ensemble from configuration and whichever backends exist.
    pub fn from_config(config: &EnsembleConfig, set: RetrieverSet) -> Result<Self> {
        let weights = &config.weights;
        let candidates = [
            ("lexical", set.lexical, weights.lexical),
            ("vector", set.vector, weights.vector),
            ("multi_query", set.multi_query, weights.multi_query),
        ];

        let mut retrievers = Vec::new();
        for (slot, retriever, weight) in candidates {
            match retriever {
                Some(retriever) => retrievers.push(WeightedRetriever::new(retriever, weight)),
                None if weight > 0.0 => {
                    warn!("No {} retriever available, skipping weight {}", slot, weight)
                }
                None => {}
            }
        }

        let mut ensemble = Self::new(retrievers, config.rank_bias_constant)?.with_limit(config.limit);
        if let Some(ms) = config.retriever_timeout_ms {
            ensemble = ensemble.with_timeout(Duration::from_millis(ms));
        }
        Ok(ensemble)
    }

    /// Truncate fused results to `limit` entries.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Treat retrievers slower than `timeout` as having returned nothing.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured result limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Run every retriever concurrently, returning lists in retriever order.
    async fn gather(&self, query: &str) -> Result<Vec<(RankedList, f64)>> {
        let mut tasks = JoinSet::new();

        for (index, weighted) in self.retrievers.iter().enumerate() {
            let retriever = Arc::clone(&weighted.retriever);
            let query = query.to_string();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let result = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, retriever.retrieve(&query)).await {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(
                                "Retriever '{}' timed out after {:?}, using an empty list",
                                retriever.name(),
                                limit
                            );
                            Ok(Vec::new())
                        }
                    },
                    None => retriever.retrieve(&query).await,
                };
                (index, result)
            });
        }

        let mut lists: Vec<Option<RankedList>> = vec![None; self.retrievers.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|e| FaqError::internal(format!("retrieval task failed: {}", e)))?;
            lists[index] = Some(result?);
        }

        Ok(lists
            .into_iter()
            .zip(&self.retrievers)
            .map(|(list, weighted)| {
                let list = list.unwrap_or_default();
                debug!(
                    "Retriever '{}' returned {} documents",
                    weighted.retriever.name(),
                    list.len()
                );
                (list, weighted.weight)
            })
            .collect())
    }

    /// Retrieve and fuse, keeping fusion scores.
    pub async fn retrieve_scored(&self, query: &str) -> Result<Vec<ScoredDocument>> {
        let lists = self.gather(query).await?;
        self.fusion.fuse_scored(&lists, self.limit)
    }
}

#[async_trait]
impl Retriever for EnsembleRetriever {
    fn name(&self) -> &str {
        "ensemble"
    }

    async fn retrieve(&self, query: &str) -> Result<RankedList> {
        Ok(self
            .retrieve_scored(query)
            .await?
            .into_iter()
            .map(|scored| scored.document)
            .collect())
    }
}
