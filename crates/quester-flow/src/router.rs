use std::collections::HashMap;

use crate::node::{Action, NodeId};

/// Transition table mapping `(current node, action)` to a successor.
///
/// Built with plain [`register`](Router::register) calls. An action with
/// no entry is the flow's terminal condition.
#[derive(Debug, Clone, Default)]
pub struct Router {
    table: HashMap<(NodeId, Action), NodeId>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transition. Re-registering the same pair overwrites.
    pub fn register(&mut self, from: NodeId, action: Action, to: NodeId) {
        self.table.insert((from, action), to);
    }

    /// Successor for an action, or `None` when the run should terminate.
    pub fn route(&self, from: NodeId, action: Action) -> Option<NodeId> {
        self.table.get(&(from, action)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_router() -> Router {
        let mut router = Router::new();
        router.register(NodeId::Decide, Action::Search, NodeId::Search);
        router.register(NodeId::Decide, Action::Answer, NodeId::Answer);
        router.register(NodeId::Search, Action::Decide, NodeId::Decide);
        router
    }

    #[test]
    fn test_transition_table() {
        let router = agent_router();
        assert_eq!(
            router.route(NodeId::Decide, Action::Search),
            Some(NodeId::Search)
        );
        assert_eq!(
            router.route(NodeId::Decide, Action::Answer),
            Some(NodeId::Answer)
        );
        assert_eq!(
            router.route(NodeId::Search, Action::Decide),
            Some(NodeId::Decide)
        );
    }

    #[test]
    fn test_unmapped_action_terminates() {
        let router = agent_router();
        assert_eq!(router.route(NodeId::Answer, Action::Done), None);
        assert_eq!(router.route(NodeId::Search, Action::Answer), None);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut router = agent_router();
        router.register(NodeId::Decide, Action::Search, NodeId::Answer);
        assert_eq!(
            router.route(NodeId::Decide, Action::Search),
            Some(NodeId::Answer)
        );
    }
}
