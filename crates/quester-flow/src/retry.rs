use std::time::Duration;

use tracing::warn;

use quester_core::error::{QuesterError, Result};

use crate::node::StageNode;

/// Run a stage's `execute` phase under its retry policy.
///
/// The input is re-cloned per attempt; `execute` never touches the
/// context, so re-running it cannot duplicate side effects. When every
/// attempt fails the error is terminal — the flow driver must not retry
/// it again.
pub async fn run_with_retry(
    node: &dyn StageNode,
    prep: serde_json::Value,
) -> Result<serde_json::Value> {
    let policy = node.retry();
    let mut last_err: Option<QuesterError> = None;

    for attempt in 1..=policy.max_attempts {
        match node.execute(prep.clone()).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < policy.max_attempts {
                    warn!(
                        stage = %node.id(),
                        attempt,
                        max_attempts = policy.max_attempts,
                        wait_ms = policy.wait_ms,
                        error = %e,
                        "Stage execute failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(policy.wait_ms)).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(QuesterError::StageExhausted {
        stage: node.id().to_string(),
        message: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "retry policy allowed no attempts".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;
    use serde_json::json;

    use quester_core::config::RetryConfig;
    use quester_core::error::{QuesterError, Result};

    use super::*;
    use crate::context::FlowContext;
    use crate::node::{Action, NodeId, StageNode};

    /// Fails the first `fail_times` execute calls, then succeeds.
    struct FlakyNode {
        retry: RetryConfig,
        fail_times: u32,
        calls: AtomicU32,
    }

    impl FlakyNode {
        fn new(fail_times: u32, max_attempts: u32) -> Self {
            Self {
                retry: RetryConfig {
                    max_attempts,
                    wait_ms: 1000,
                },
                fail_times,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl StageNode for FlakyNode {
        fn id(&self) -> NodeId {
            NodeId::Decide
        }

        fn retry(&self) -> &RetryConfig {
            &self.retry
        }

        fn prepare(&self, _ctx: &FlowContext) -> Result<serde_json::Value> {
            Ok(json!("input"))
        }

        fn execute(&self, prep: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if call < self.fail_times {
                    Err(QuesterError::Oracle("connection reset".into()))
                } else {
                    Ok(prep)
                }
            })
        }

        fn finalize(
            &self,
            _ctx: &mut FlowContext,
            _prep: serde_json::Value,
            _exec: serde_json::Value,
        ) -> Result<Action> {
            Ok(Action::Done)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_attempt_without_waiting() {
        let node = FlakyNode::new(0, 3);
        let out = run_with_retry(&node, json!("x")).await.unwrap();
        assert_eq!(out, json!("x"));
        assert_eq!(node.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let node = FlakyNode::new(2, 3);
        let out = run_with_retry(&node, json!("x")).await.unwrap();
        assert_eq!(out, json!("x"));
        assert_eq!(node.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_terminal_and_names_the_stage() {
        let node = FlakyNode::new(10, 3);
        let err = run_with_retry(&node, json!("x")).await.unwrap_err();
        assert_eq!(node.calls.load(Ordering::SeqCst), 3);
        match err {
            QuesterError::StageExhausted { stage, message } => {
                assert_eq!(stage, "decide");
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected StageExhausted, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_is_a_single_result() {
        // A second-attempt success produces exactly one output value, so a
        // stage's finalize runs once and context mutation happens once.
        let node = FlakyNode::new(1, 3);
        let mut ctx = FlowContext::new("q");
        let prep = node.prepare(&ctx).unwrap();
        let exec = run_with_retry(&node, prep.clone()).await.unwrap();
        let action = node.finalize(&mut ctx, prep, exec).unwrap();
        assert_eq!(action, Action::Done);
        assert_eq!(node.calls.load(Ordering::SeqCst), 2);
    }
}
