//! Flow Engine — action-routed orchestration of decide/search/answer stages.
//!
//! A run is a walk over a small directed graph. Each stage implements
//! [`StageNode`] with three phases: `prepare` reads the shared
//! [`FlowContext`] and produces an input value, `execute` is a pure
//! transformation of that input (wrapped in the retry policy), and
//! `finalize` writes results back into the context and returns an
//! [`Action`]. The [`Router`] maps `(node, action)` pairs to successors;
//! an action with no entry terminates the run.
//!
//! Retries wrap only `execute`, so a retried attempt can never duplicate
//! context side effects. Loop bounding is not the driver's job: the decide
//! stage forces `answer` once the search budget is spent.

pub mod context;
pub mod decision;
pub mod flow;
pub mod node;
pub mod retry;
pub mod router;
pub mod stages;

pub use context::FlowContext;
pub use flow::{search_answer_flow, Flow};
pub use node::{Action, NodeId, StageNode};
pub use router::Router;
pub use stages::{AnswerNode, DecideNode, SearchNode};
