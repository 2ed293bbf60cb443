use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{info, warn};

use quester_core::config::RetryConfig;
use quester_core::error::{QuesterError, Result};
use quester_core::traits::SearchProvider;
use quester_core::types::{SearchHit, SearchRecord};

use crate::context::FlowContext;
use crate::node::{Action, NodeId, StageNode};

/// Runs the pending query against the retrieval oracle and appends the
/// formatted results to the history.
///
/// Retrieval failures never abort the run: they become placeholder text
/// the decide stage can reason over. Control always returns to decide.
pub struct SearchNode {
    provider: Arc<dyn SearchProvider>,
    retry: RetryConfig,
    max_results: usize,
}

impl SearchNode {
    pub fn new(provider: Arc<dyn SearchProvider>, retry: RetryConfig, max_results: usize) -> Self {
        Self {
            provider,
            retry,
            max_results,
        }
    }
}

impl StageNode for SearchNode {
    fn id(&self) -> NodeId {
        NodeId::Search
    }

    fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    fn prepare(&self, ctx: &FlowContext) -> Result<serde_json::Value> {
        let query = ctx
            .search_query()
            .ok_or_else(|| QuesterError::Flow("search stage reached with no pending query".into()))?;
        Ok(json!(query))
    }

    fn execute(&self, prep: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value>> {
        Box::pin(async move {
            let query = prep.as_str().unwrap_or_default().to_string();

            let results = match self.provider.retrieve(query, self.max_results).await {
                Ok(hits) if hits.is_empty() => "No search results found.".to_string(),
                Ok(hits) => format_hits(&hits),
                Err(e) => {
                    warn!(error = %e, "Retrieval failed, recording placeholder text");
                    format!("Error during search: {e}")
                }
            };

            Ok(json!(results))
        })
    }

    fn finalize(
        &self,
        ctx: &mut FlowContext,
        prep: serde_json::Value,
        exec: serde_json::Value,
    ) -> Result<Action> {
        let query = prep.as_str().unwrap_or_default().to_string();
        let results = exec.as_str().unwrap_or_default().to_string();

        ctx.push_search(SearchRecord { query, results });
        info!(total_searches = ctx.search_count(), "Search round recorded");

        Ok(Action::Decide)
    }
}

/// Number the hits into a single text block.
fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n{}\nURL: {}\n", i + 1, hit.title, hit.snippet, hit.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Vec<SearchHit>);

    impl SearchProvider for FixedProvider {
        fn retrieve(
            &self,
            _query: String,
            _max_results: usize,
        ) -> BoxFuture<'_, Result<Vec<SearchHit>>> {
            let hits = self.0.clone();
            Box::pin(async move { Ok(hits) })
        }
    }

    struct BrokenProvider;

    impl SearchProvider for BrokenProvider {
        fn retrieve(
            &self,
            _query: String,
            _max_results: usize,
        ) -> BoxFuture<'_, Result<Vec<SearchHit>>> {
            Box::pin(async move { Err(QuesterError::Retrieval("dns failure".into())) })
        }
    }

    fn hit(n: usize) -> SearchHit {
        SearchHit {
            title: format!("Title {n}"),
            url: format!("https://example.com/{n}"),
            snippet: format!("Snippet {n}"),
        }
    }

    fn ctx_with_query(query: &str) -> FlowContext {
        let mut ctx = FlowContext::new("q");
        ctx.set_search_query(query);
        ctx
    }

    #[tokio::test]
    async fn test_appends_formatted_results_and_returns_decide() {
        let node = SearchNode::new(
            Arc::new(FixedProvider(vec![hit(1), hit(2)])),
            RetryConfig::default(),
            5,
        );
        let mut ctx = ctx_with_query("rust web frameworks");

        let prep = node.prepare(&ctx).unwrap();
        let exec = node.execute(prep.clone()).await.unwrap();
        let action = node.finalize(&mut ctx, prep, exec).unwrap();

        assert_eq!(action, Action::Decide);
        assert_eq!(ctx.search_count(), 1);
        let history = ctx.search_history();
        assert_eq!(history[0].query, "rust web frameworks");
        assert!(history[0].results.contains("1. Title 1"));
        assert!(history[0].results.contains("2. Title 2"));
        assert!(history[0].results.contains("URL: https://example.com/2"));
    }

    #[tokio::test]
    async fn test_empty_results_record_placeholder() {
        let node = SearchNode::new(
            Arc::new(FixedProvider(Vec::new())),
            RetryConfig::default(),
            5,
        );
        let mut ctx = ctx_with_query("nothing to find");

        let prep = node.prepare(&ctx).unwrap();
        let exec = node.execute(prep.clone()).await.unwrap();
        node.finalize(&mut ctx, prep, exec).unwrap();

        assert_eq!(
            ctx.search_history()[0].results,
            "No search results found."
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_absorbed_not_propagated() {
        let node = SearchNode::new(Arc::new(BrokenProvider), RetryConfig::default(), 5);
        let mut ctx = ctx_with_query("flaky");

        let prep = node.prepare(&ctx).unwrap();
        let exec = node.execute(prep.clone()).await.unwrap();
        let action = node.finalize(&mut ctx, prep, exec).unwrap();

        assert_eq!(action, Action::Decide);
        assert_eq!(ctx.search_count(), 1);
        assert!(ctx.search_history()[0].results.contains("Error during search"));
        assert!(ctx.search_history()[0].results.contains("dns failure"));
    }

    #[test]
    fn test_prepare_without_pending_query_is_a_wiring_error() {
        let node = SearchNode::new(Arc::new(BrokenProvider), RetryConfig::default(), 5);
        let ctx = FlowContext::new("q");
        assert!(node.prepare(&ctx).is_err());
    }
}
