use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::info;

use quester_core::config::RetryConfig;
use quester_core::error::Result;
use quester_core::traits::ReasoningClient;
use quester_core::types::SearchRecord;

use crate::context::FlowContext;
use crate::node::{Action, NodeId, StageNode};

/// Composes the final answer from the question and the accumulated search
/// history, then terminates the run.
///
/// When the decide stage already carried an inline answer, it is used
/// directly and the oracle is not consulted again.
pub struct AnswerNode {
    llm: Arc<dyn ReasoningClient>,
    retry: RetryConfig,
}

impl AnswerNode {
    pub fn new(llm: Arc<dyn ReasoningClient>, retry: RetryConfig) -> Self {
        Self { llm, retry }
    }
}

impl StageNode for AnswerNode {
    fn id(&self) -> NodeId {
        NodeId::Answer
    }

    fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    fn prepare(&self, ctx: &FlowContext) -> Result<serde_json::Value> {
        if let Some(draft) = ctx.draft_answer() {
            return Ok(json!({ "direct": draft }));
        }
        let prompt = build_prompt(ctx.question(), &ctx.search_history());
        Ok(json!({ "prompt": prompt }))
    }

    fn execute(&self, prep: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value>> {
        Box::pin(async move {
            if let Some(direct) = prep["direct"].as_str() {
                return Ok(json!(direct));
            }
            let prompt = prep["prompt"].as_str().unwrap_or_default().to_string();
            let answer = self.llm.reason(prompt).await?;
            Ok(json!(answer))
        })
    }

    fn finalize(
        &self,
        ctx: &mut FlowContext,
        _prep: serde_json::Value,
        exec: serde_json::Value,
    ) -> Result<Action> {
        let answer = exec.as_str().unwrap_or_default().to_string();
        info!(chars = answer.len(), "Final answer composed");
        ctx.set_final_answer(answer);
        Ok(Action::Done)
    }
}

/// Synthesis prompt enumerating every prior search alongside the question.
fn build_prompt(question: &str, history: &[SearchRecord]) -> String {
    let mut search_context = String::new();
    if !history.is_empty() {
        search_context.push_str("\nSearch results:\n");
        for (i, record) in history.iter().enumerate() {
            search_context.push_str(&format!(
                "Search {} - Query: {}\nResults:\n{}\n\n",
                i + 1,
                record.query,
                record.results
            ));
        }
    }

    format!(
        "You are a helpful assistant. Answer the user's question using the \
         search results below and your own knowledge.\n\n\
         Question: {question}\n{search_context}\n\
         Provide a clear, accurate, and complete answer. Cite the search \
         results where relevant.\n\nAnswer:"
    )
}
