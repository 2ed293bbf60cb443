use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use quester_core::config::AppConfig;
use quester_core::error::{QuesterError, Result};
use quester_core::traits::{ReasoningClient, SearchProvider};

use crate::context::FlowContext;
use crate::node::{Action, NodeId, StageNode};
use crate::retry::run_with_retry;
use crate::router::Router;
use crate::stages::{AnswerNode, DecideNode, SearchNode};

/// Drives a run: prepare, execute (retried), finalize, route; repeat until
/// an action has no route.
///
/// The driver enforces no loop bound of its own — bounding is the decide
/// stage's policy. Only retry exhaustion escapes this loop as an error.
pub struct Flow {
    nodes: HashMap<NodeId, Box<dyn StageNode>>,
    router: Router,
    entry: NodeId,
}

impl Flow {
    pub fn new(nodes: Vec<Box<dyn StageNode>>, router: Router, entry: NodeId) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.id(), n)).collect();
        Self {
            nodes,
            router,
            entry,
        }
    }

    /// Run to termination, mutating the context in place. The context is
    /// exclusively owned by this run; callers inspect it afterwards.
    pub async fn run(&self, ctx: &mut FlowContext) -> Result<()> {
        let mut current = self.entry;

        loop {
            let node = self.nodes.get(&current).ok_or_else(|| {
                QuesterError::Flow(format!("node '{current}' is not registered in the flow"))
            })?;

            info!(node = %current, "Executing flow node");

            let prep = node.prepare(ctx)?;
            let exec = run_with_retry(node.as_ref(), prep.clone()).await?;
            let action = node.finalize(ctx, prep, exec)?;

            match self.router.route(current, action) {
                Some(next) => {
                    debug!(from = %current, action = %action, to = %next, "Routing");
                    current = next;
                }
                None => {
                    debug!(from = %current, action = %action, "No route for action, flow complete");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Assemble the decide/search/answer flow.
///
/// Transition table: decide --search--> search, decide --answer--> answer,
/// search --decide--> decide. The answer stage's `done` has no entry and
/// terminates the run.
pub fn search_answer_flow(
    llm: Arc<dyn ReasoningClient>,
    search: Arc<dyn SearchProvider>,
    config: &AppConfig,
) -> Flow {
    let decide = DecideNode::new(
        llm.clone(),
        config.retry.clone(),
        config.agent.max_searches,
        config.agent.result_preview_chars,
    );
    let search_node = SearchNode::new(search, config.retry.clone(), config.agent.max_results);
    let answer = AnswerNode::new(llm, config.retry.clone());

    let mut router = Router::new();
    router.register(NodeId::Decide, Action::Search, NodeId::Search);
    router.register(NodeId::Decide, Action::Answer, NodeId::Answer);
    router.register(NodeId::Search, Action::Decide, NodeId::Decide);

    Flow::new(
        vec![Box::new(decide), Box::new(search_node), Box::new(answer)],
        router,
        NodeId::Decide,
    )
}
