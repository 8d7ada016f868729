//! Mock searcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{Candidate, DateGranularity, SearchError, Searcher, SourceCapabilities};

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&str) -> Option<Vec<Candidate>> + Send + Sync>;

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results
/// - Track search queries for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use episodarr_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new("mock");
/// searcher.set_query_handler(|q| {
///     q.ends_with("1080p").then(|| vec![fixtures::trusted_candidate(..)])
/// }).await;
///
/// let results = searcher.search("Alpha S02E05 1080p").await?;
/// assert_eq!(searcher.recorded_queries().await, vec!["Alpha S02E05 1080p"]);
/// ```
pub struct MockSearcher {
    name: String,
    capabilities: SourceCapabilities,
    /// Configured results to return when no handler matches.
    results: Arc<RwLock<Vec<Candidate>>>,
    /// Recorded search queries.
    queries: Arc<RwLock<Vec<String>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Query handler for dynamic result generation based on query string.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl MockSearcher {
    /// Create a mock searcher that exposes dates, trust flags and categories.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capabilities(
            name,
            SourceCapabilities {
                dates: DateGranularity::Date,
                trust_signals: true,
                categories: true,
            },
        )
    }

    /// Create a mock searcher with explicit capabilities.
    pub fn with_capabilities(name: impl Into<String>, capabilities: SourceCapabilities) -> Self {
        Self {
            name: name.into(),
            capabilities,
            results: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<Candidate>) {
        *self.results.write().await = results;
    }

    /// Set a query handler that dynamically generates results based on the query string.
    ///
    /// Returning `None` falls back to the configured results.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Option<Vec<Candidate>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded search queries, in call order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        self.queries.write().await.push(query.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(handler) = self.query_handler.read().await.as_ref() {
            if let Some(results) = handler(query) {
                return Ok(results
                    .into_iter()
                    .map(|mut c| {
                        c.source = self.name.clone();
                        c
                    })
                    .collect());
            }
        }

        Ok(self
            .results
            .read()
            .await
            .iter()
            .cloned()
            .map(|mut c| {
                c.source = self.name.clone();
                c
            })
            .collect())
    }
}
