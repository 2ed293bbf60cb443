use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::SearchHit;

/// Reasoning oracle — free-form text completion.
///
/// Transient failures are retried by the flow's retry wrapper; an error
/// here is what the wrapper sees, not necessarily what the run sees.
pub trait ReasoningClient: Send + Sync + 'static {
    fn reason(&self, prompt: String) -> BoxFuture<'_, Result<String>>;
}

/// Retrieval oracle — web search.
///
/// Callers absorb errors into placeholder text; a flaky provider degrades
/// answer quality rather than aborting the run.
pub trait SearchProvider: Send + Sync + 'static {
    fn retrieve(
        &self,
        query: String,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<SearchHit>>>;
}
