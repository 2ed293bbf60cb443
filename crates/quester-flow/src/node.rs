use std::fmt;

use futures::future::BoxFuture;

use quester_core::config::RetryConfig;
use quester_core::error::Result;

use crate::context::FlowContext;

/// Identity of a stage in the flow graph. The stage set is small and
/// closed, so an enum beats stringly-typed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Decide,
    Search,
    Answer,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Decide => "decide",
            NodeId::Search => "search",
            NodeId::Answer => "answer",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing action returned by a stage's `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Search,
    Answer,
    Decide,
    Done,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Search => "search",
            Action::Answer => "answer",
            Action::Decide => "decide",
            Action::Done => "done",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work in the flow.
///
/// `prepare` reads the context and produces the execute input. `execute`
/// must be side-effect-free with respect to the context — it is the only
/// phase the retry wrapper re-runs, and the separation guarantees retries
/// never duplicate context writes. `finalize` applies all context
/// mutations and picks the routing action.
///
/// Stages hold no run state beyond their configuration; everything a run
/// accumulates lives in the [`FlowContext`].
pub trait StageNode: Send + Sync {
    fn id(&self) -> NodeId;

    /// Retry policy for this stage's `execute` phase.
    fn retry(&self) -> &RetryConfig;

    fn prepare(&self, ctx: &FlowContext) -> Result<serde_json::Value>;

    fn execute(&self, prep: serde_json::Value) -> BoxFuture<'_, Result<serde_json::Value>>;

    fn finalize(
        &self,
        ctx: &mut FlowContext,
        prep: serde_json::Value,
        exec: serde_json::Value,
    ) -> Result<Action>;
}
