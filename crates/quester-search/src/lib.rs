//! Retrieval oracle client backed by the Tavily search API.
//!
//! Errors from this crate are surfaced to the search stage, which absorbs
//! them into placeholder history text instead of aborting the run.

use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use quester_core::error::{QuesterError, Result};
use quester_core::traits::SearchProvider;
use quester_core::types::SearchHit;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

pub struct TavilyClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: TAVILY_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl SearchProvider for TavilyClient {
    fn retrieve(
        &self,
        query: String,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<SearchHit>>> {
        Box::pin(async move {
            debug!(%query, max_results, "Sending retrieval request");

            let resp = self
                .http
                .post(self.base_url.as_str())
                .json(&json!({
                    "api_key": self.api_key,
                    "query": query,
                    "max_results": max_results,
                }))
                .send()
                .await
                .map_err(|e| QuesterError::Retrieval(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(QuesterError::Retrieval(format!("HTTP {status}")));
            }

            let body: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| QuesterError::Retrieval(format!("malformed response body: {e}")))?;

            Ok(parse_hits(&body))
        })
    }
}

/// Pull title/url/content rows out of a Tavily response body. Rows with
/// missing fields get empty strings rather than being dropped.
fn parse_hits(body: &serde_json::Value) -> Vec<SearchHit> {
    body["results"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| SearchHit {
                    title: row["title"].as_str().unwrap_or_default().to_string(),
                    url: row["url"].as_str().unwrap_or_default().to_string(),
                    snippet: row["content"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
