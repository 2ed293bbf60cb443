use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, info};

use quester_core::config::RetryConfig;
use quester_core::error::{QuesterError, Result};
use quester_core::traits::ReasoningClient;
use quester_core::types::{Decision, DecisionAction, SearchRecord};

use crate::context::FlowContext;
use crate::decision::parse_decision;
use crate::node::{Action, NodeId, StageNode};

/// Asks the reasoning oracle whether to search or answer.
///
/// This stage is the sole termination authority: once the search budget is
/// spent it forces `answer` regardless of what the oracle asked for, so
/// the flow cannot loop forever on an oracle that keeps requesting
/// searches.
pub struct DecideNode {
    llm: Arc<dyn ReasoningClient>,
    retry: RetryConfig,
    max_searches: usize,
    preview_chars: usize,
}

impl DecideNode {
    pub fn new(
        llm: Arc<dyn ReasoningClient>,
        retry: RetryConfig,
        max_searches: usize,
        preview_chars: usize,
    ) -> Self {
        Self {
            llm,
            retry,
            max_searches,
            preview_chars,
        }
    }
}

impl StageNode for DecideNode {
    fn id(&self) -> NodeId {
        NodeId::Decide
    }

    fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    fn prepare(&self, ctx: &FlowContext) -> Result<serde_json::Value> {
        let prompt = build_prompt(
            ctx.question(),
            &ctx.search_history(),
            self.max_searches,
            self.preview_chars,
        );
        // The fallback decision needs the question, and execute cannot
        // read the context.
        Ok(json!({ "prompt": prompt, "question": ctx.question() }))
    }

    fn execute(&self, prep: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value>> {
        Box::pin(async move {
            let prompt = prep["prompt"].as_str().unwrap_or_default().to_string();
            let question = prep["question"].as_str().unwrap_or_default();

            let response = self.llm.reason(prompt).await?;
            let decision = parse_decision(&response, question);
            debug!(action = ?decision.action, "Decide stage parsed a decision");
            Ok(serde_json::to_value(decision)?)
        })
    }

    fn finalize(
        &self,
        ctx: &mut FlowContext,
        _prep: serde_json::Value,
        exec: serde_json::Value,
    ) -> Result<Action> {
        let mut decision: Decision = serde_json::from_value(exec)?;

        // Budget enforcement happens here, not in the prompt: the oracle
        // is advisory and must not be relied on to self-limit.
        if decision.action == DecisionAction::Search && ctx.search_count() >= self.max_searches {
            info!(
                max_searches = self.max_searches,
                "Search budget spent, forcing answer"
            );
            decision = Decision {
                action: DecisionAction::Answer,
                reasoning: format!(
                    "search budget of {} rounds spent; answering with accumulated context",
                    self.max_searches
                ),
                search_query: None,
                answer: decision.answer,
            };
        }

        ctx.set_last_decision(&decision);

        match decision.action {
            DecisionAction::Search => {
                let query = decision
                    .search_query
                    .ok_or_else(|| QuesterError::Flow("search decision lost its query".into()))?;
                ctx.set_search_query(query);
                Ok(Action::Search)
            }
            DecisionAction::Answer => {
                if let Some(answer) = decision.answer {
                    ctx.set_draft_answer(answer);
                }
                Ok(Action::Answer)
            }
        }
    }
}

/// Format the decision prompt: the question, a condensed view of prior
/// searches, and the remaining budget.
fn build_prompt(
    question: &str,
    history: &[SearchRecord],
    max_searches: usize,
    preview_chars: usize,
) -> String {
    let mut search_context = String::new();
    if !history.is_empty() {
        search_context.push_str("\nPrevious search results:\n");
        for (i, record) in history.iter().enumerate() {
            search_context.push_str(&format!(
                "Search {}: {}\nResults: {}\n\n",
                i + 1,
                record.query,
                preview(&record.results, preview_chars)
            ));
        }
    }

    format!(
        r#"You are an assistant deciding whether to search the web for more information or answer a question directly.

Question: {question}
{search_context}
You have used {used} of {max_searches} search rounds.

Search when the question needs recent or specific facts that prior results do not cover. Answer when you already have enough information.

Reply with your decision in a fenced YAML block:
```yaml
action: search or answer
reasoning: brief explanation of your choice
search_query: what to search for (only when action is search)
answer: the answer text (optional, only when action is answer)
```"#,
        question = question,
        search_context = search_context,
        used = history.len(),
        max_searches = max_searches,
    )
}

/// Char-safe truncation with an ellipsis marker.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}
