use serde::{Deserialize, Serialize};

/// A single row returned by the retrieval oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// One completed search round: the query that was run and the formatted
/// results text. Entries are appended to the context's search history in
/// chronological order and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub results: String,
}

/// What the decide stage chose to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Search,
    Answer,
}

/// Structured output of the decide stage, parsed from the reasoning
/// oracle's fenced YAML block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    #[serde(default)]
    pub reasoning: String,
    /// Present when `action` is `search`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Inline answer the oracle may supply when `action` is `answer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl Decision {
    /// A decision is usable when a search action carries a non-empty query.
    pub fn is_valid(&self) -> bool {
        match self.action {
            DecisionAction::Search => self
                .search_query
                .as_deref()
                .is_some_and(|q| !q.trim().is_empty()),
            DecisionAction::Answer => true,
        }
    }

    /// Deterministic replacement for an unusable decision: search for the
    /// original question so the loop always has a legal next step.
    pub fn fallback(question: &str, note: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Search,
            reasoning: note.into(),
            search_query: Some(question.to_string()),
            answer: None,
        }
    }
}
