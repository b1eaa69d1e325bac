//! In-memory vector-similarity retriever.
//!
//! Embeddings come from an external [`Embedder`]; this module only stores
//! them and ranks documents by cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use faq_core::{Document, Embedder, FaqError, RankedList, Result, Retriever, VectorConfig};

/// Retriever ranking documents by cosine similarity to the query embedding.
pub struct VectorRetriever<E> {
    /// Embedding model.
    embedder: Arc<E>,

    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,

    /// Number of documents returned per query.
    k: usize,
}

impl<E> VectorRetriever<E>
where
    E: Embedder,
{
    /// Embed the documents and build the index.
    pub async fn from_documents(
        embedder: Arc<E>,
        documents: Vec<Document>,
        config: &VectorConfig,
    ) -> Result<Self> {
        let embeddings = if documents.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
            embedder.embed_documents(&texts).await?
        };

        if embeddings.len() != documents.len() {
            return Err(FaqError::embedding(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let dimension = embedder.dimension();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(FaqError::embedding(format!(
                "embedding has dimension {}, expected {}",
                bad.len(),
                dimension
            )));
        }

        debug!("Built vector index over {} documents", documents.len());

        Ok(Self {
            embedder,
            documents,
            embeddings,
            k: config.k,
        })
    }

    /// Set the number of documents returned per query.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    async fn rank(&self, query: &str) -> Result<RankedList> {
        let query_embedding = self.embedder.embed_query(query).await?;
        if query_embedding.len() != self.embedder.dimension() {
            return Err(FaqError::embedding(format!(
                "query embedding has dimension {}, expected {}",
                query_embedding.len(),
                self.embedder.dimension()
            )));
        }

        let similarities: Vec<f64> = self
            .embeddings
            .iter()
            .map(|e| cosine_similarity(&query_embedding, e))
            .collect();

        let mut ranked: Vec<usize> = (0..similarities.len()).collect();
        ranked.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]));
        ranked.truncate(self.k);

        Ok(ranked.into_iter().map(|i| self.documents[i].clone()).collect())
    }
}

/// Cosine similarity; zero vectors are similar to nothing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl<E> Retriever for VectorRetriever<E>
where
    E: Embedder,
{
    fn name(&self) -> &str {
        "vector"
    }

    async fn retrieve(&self, query: &str) -> Result<RankedList> {
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        // Query-time backend failures are reported against this retriever.
        self.rank(query)
            .await
            .map_err(|e| FaqError::retrieval(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds text as counts of a few marker characters.
    struct MarkerEmbedder;

    impl MarkerEmbedder {
        fn embed(text: &str) -> Vec<f32> {
            ['返', '送', '保']
                .iter()
                .map(|m| text.chars().filter(|c| c == m).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for MarkerEmbedder {
        async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| Self::embed(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(Self::embed(text))
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    /// Returns vectors of the wrong size.
    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Embeds documents but fails on queries.
    struct QueryFailingEmbedder;

    #[async_trait]
    impl Embedder for QueryFailingEmbedder {
        async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Err(FaqError::embedding("embedding service unavailable"))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("返品について"),
            Document::new("配送について 送料"),
            Document::new("保証について"),
        ]
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_most_similar() {
        let retriever =
            VectorRetriever::from_documents(Arc::new(MarkerEmbedder), corpus(), &VectorConfig::default())
                .await
                .unwrap();

        let results = retriever.retrieve("送料を知りたい").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "配送について 送料");
    }

    #[tokio::test]
    async fn test_empty_index() {
        let retriever =
            VectorRetriever::from_documents(Arc::new(MarkerEmbedder), Vec::new(), &VectorConfig::default())
                .await
                .unwrap();

        assert!(retriever.is_empty());
        assert!(retriever.retrieve("返品").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let result =
            VectorRetriever::from_documents(Arc::new(BrokenEmbedder), corpus(), &VectorConfig::default())
                .await;

        match result {
            Err(err) => assert_eq!(err.error_code(), "EMBEDDING_ERROR"),
            Ok(_) => panic!("expected a dimension error"),
        }
    }

    #[tokio::test]
    async fn test_query_failure_is_retrieval_error() {
        let retriever = VectorRetriever::from_documents(
            Arc::new(QueryFailingEmbedder),
            corpus(),
            &VectorConfig::default(),
        )
        .await
        .unwrap();

        let err = retriever.retrieve("返品").await.unwrap_err();
        assert_eq!(err.error_code(), "RETRIEVAL_ERROR");
        assert!(err.to_string().contains("vector"));
        assert!(err.to_string().contains("embedding service unavailable"));
    }
}
