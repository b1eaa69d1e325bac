//! Query-expansion retriever.
//!
//! A language model rewrites the question into several alternative queries;
//! each is run against a base retriever and the unique union is returned.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, info};

use faq_core::{DocumentId, FaqError, MultiQueryConfig, QueryGenerator, RankedList, Result, Retriever};

/// Retriever that expands the question with generated queries.
pub struct MultiQueryRetriever {
    generator: Arc<dyn QueryGenerator>,
    retriever: Arc<dyn Retriever>,
    include_original: bool,
}

impl MultiQueryRetriever {
    /// Create a multi-query retriever over a base retriever.
    pub fn new(
        generator: Arc<dyn QueryGenerator>,
        retriever: Arc<dyn Retriever>,
        config: &MultiQueryConfig,
    ) -> Self {
        Self {
            generator,
            retriever,
            include_original: config.include_original,
        }
    }

    /// Build the list of queries to run.
    async fn queries(&self, question: &str) -> Result<Vec<String>> {
        let mut queries = self.generator.generate_queries(question).await?;
        info!("Generated queries: {:?}", queries);

        if self.include_original {
            queries.push(question.to_string());
        }
        Ok(queries)
    }
}

/// Run one retriever for several queries concurrently.
///
/// Results come back in query order regardless of completion order.
async fn retrieve_all(retriever: &Arc<dyn Retriever>, queries: Vec<String>) -> Result<Vec<RankedList>> {
    let mut tasks = JoinSet::new();
    let count = queries.len();

    for (index, query) in queries.into_iter().enumerate() {
        let retriever = Arc::clone(retriever);
        tasks.spawn(async move { (index, retriever.retrieve(&query).await) });
    }

    let mut lists: Vec<Option<RankedList>> = vec![None; count];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) =
            joined.map_err(|e| FaqError::internal(format!("retrieval task failed: {}", e)))?;
        lists[index] = Some(result?);
    }

    Ok(lists.into_iter().flatten().collect())
}

/// Unique union of ranked lists, in list order then rank order.
fn unique_union(lists: Vec<RankedList>) -> RankedList {
    let mut seen: HashSet<DocumentId> = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|doc| seen.insert(doc.id()))
        .collect()
}

#[async_trait]
impl Retriever for MultiQueryRetriever {
    fn name(&self) -> &str {
        "multi_query"
    }

    async fn retrieve(&self, query: &str) -> Result<RankedList> {
        let queries = self.queries(query).await?;
        let lists = retrieve_all(&self.retriever, queries).await?;
        let union = unique_union(lists);

        debug!("Multi-query retrieval returned {} unique documents", union.len());
        Ok(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faq_core::{parse_query_lines, Document};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Answers with a fixed, newline-separated list of rewrites.
    struct FixedGenerator(&'static str);

    #[async_trait]
    impl QueryGenerator for FixedGenerator {
        async fn generate_queries(&self, _question: &str) -> Result<Vec<String>> {
            Ok(parse_query_lines(self.0))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl QueryGenerator for FailingGenerator {
        async fn generate_queries(&self, _question: &str) -> Result<Vec<String>> {
            Err(FaqError::generation("model unavailable"))
        }
    }

    /// Maps queries to canned results; the first query answers slowest.
    struct TableRetriever(HashMap<&'static str, Vec<&'static str>>);

    #[async_trait]
    impl Retriever for TableRetriever {
        fn name(&self) -> &str {
            "table"
        }

        async fn retrieve(&self, query: &str) -> Result<RankedList> {
            if query == "q1" {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Ok(self
                .0
                .get(query)
                .map(|docs| docs.iter().map(|s| Document::new(*s)).collect())
                .unwrap_or_default())
        }
    }

    fn table() -> Arc<dyn Retriever> {
        let mut map = HashMap::new();
        map.insert("q1", vec!["a", "b"]);
        map.insert("q2", vec!["b", "c"]);
        map.insert("original", vec!["d", "a"]);
        Arc::new(TableRetriever(map))
    }

    fn contents(list: &[Document]) -> Vec<&str> {
        list.iter().map(|d| d.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_union_in_query_order() {
        let retriever = MultiQueryRetriever::new(
            Arc::new(FixedGenerator("q1\n\nq2\n")),
            table(),
            &MultiQueryConfig::default(),
        );

        let results = retriever.retrieve("original").await.unwrap();
        assert_eq!(contents(&results), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_include_original() {
        let retriever = MultiQueryRetriever::new(
            Arc::new(FixedGenerator("q1\nq2")),
            table(),
            &MultiQueryConfig {
                include_original: true,
            },
        );

        let results = retriever.retrieve("original").await.unwrap();
        assert_eq!(contents(&results), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_no_generated_queries() {
        let retriever = MultiQueryRetriever::new(
            Arc::new(FixedGenerator("\n\n")),
            table(),
            &MultiQueryConfig::default(),
        );

        assert!(retriever.retrieve("original").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_error_propagates() {
        let retriever =
            MultiQueryRetriever::new(Arc::new(FailingGenerator), table(), &MultiQueryConfig::default());

        let err = retriever.retrieve("original").await.unwrap_err();
        assert_eq!(err.error_code(), "GENERATION_ERROR");
    }
}
