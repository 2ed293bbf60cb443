use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use quester_core::types::{Decision, SearchRecord};

/// Shared context for a single run.
///
/// An open string-to-JSON map, created once per run with only the question
/// populated, mutated by every stage's `finalize`, and handed back to the
/// caller when the run terminates. The context itself enforces nothing;
/// validity lives in the stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowContext {
    data: HashMap<String, serde_json::Value>,
}

impl FlowContext {
    /// Create a context for a new run. The question is immutable for the
    /// run's duration.
    pub fn new(question: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.set_str("question", question);
        ctx.set("search_history", json!([]));
        ctx.set("search_count", json!(0));
        ctx
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a value as a string, if it's a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Set a value (overwrites).
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Set a string value.
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .insert(key.into(), serde_json::Value::String(value.into()));
    }

    /// The user's question.
    pub fn question(&self) -> &str {
        self.get_str("question").unwrap_or_default()
    }

    /// All completed search rounds, in chronological order.
    pub fn search_history(&self) -> Vec<SearchRecord> {
        self.get("search_history")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Number of completed search rounds. Always equals the history length.
    pub fn search_count(&self) -> usize {
        self.get("search_history")
            .and_then(|v| v.as_array())
            .map_or(0, |a| a.len())
    }

    /// Append a completed round to the history. Entries are never mutated,
    /// reordered, or removed afterwards.
    pub fn push_search(&mut self, record: SearchRecord) {
        let entry = json!({ "query": record.query, "results": record.results });
        match self
            .data
            .entry("search_history".to_string())
            .or_insert_with(|| json!([]))
            .as_array_mut()
        {
            Some(history) => history.push(entry),
            None => {
                // A non-array value under this key is a stage bug; start over
                // rather than silently dropping the record.
                self.data
                    .insert("search_history".to_string(), json!([entry]));
            }
        }
        let count = self.search_count();
        self.set("search_count", json!(count));
    }

    /// The most recent decide-stage output.
    pub fn last_decision(&self) -> Option<Decision> {
        self.get("last_decision")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set_last_decision(&mut self, decision: &Decision) {
        self.set(
            "last_decision",
            serde_json::to_value(decision).unwrap_or(serde_json::Value::Null),
        );
    }

    /// Query staged by decide for the search stage to pick up.
    pub fn search_query(&self) -> Option<String> {
        self.get_str("search_query").map(str::to_string)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.set_str("search_query", query);
    }

    /// Inline answer carried by a decide output, short-circuiting the
    /// answer stage's oracle call.
    pub fn draft_answer(&self) -> Option<String> {
        self.get_str("draft_answer").map(str::to_string)
    }

    pub fn set_draft_answer(&mut self, answer: impl Into<String>) {
        self.set_str("draft_answer", answer);
    }

    /// The final answer, set exactly once by the answer stage.
    pub fn final_answer(&self) -> Option<&str> {
        self.get_str("final_answer")
    }

    pub fn set_final_answer(&mut self, answer: impl Into<String>) {
        self.set_str("final_answer", answer);
    }

    /// The underlying data map.
    pub fn data(&self) -> &HashMap<String, serde_json::Value> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quester_core::types::{DecisionAction, SearchRecord};

    #[test]
    fn test_new_context_has_question_and_empty_history() {
        let ctx = FlowContext::new("why is the sky blue?");
        assert_eq!(ctx.question(), "why is the sky blue?");
        assert!(ctx.search_history().is_empty());
        assert_eq!(ctx.search_count(), 0);
        assert!(ctx.final_answer().is_none());
        assert!(ctx.last_decision().is_none());
    }

    #[test]
    fn test_generic_get_set() {
        let mut ctx = FlowContext::new("q");
        ctx.set("score", json!(9.5));
        ctx.set_str("note", "hi");
        assert_eq!(ctx.get("score"), Some(&json!(9.5)));
        assert_eq!(ctx.get_str("note"), Some("hi"));
        assert_eq!(ctx.get("missing"), None);
        ctx.set_str("note", "overwritten");
        assert_eq!(ctx.get_str("note"), Some("overwritten"));
    }

    #[test]
    fn test_history_grows_monotonically_and_count_tracks() {
        let mut ctx = FlowContext::new("q");
        for i in 0..4 {
            ctx.push_search(SearchRecord {
                query: format!("query {i}"),
                results: format!("results {i}"),
            });
            assert_eq!(ctx.search_count(), i + 1);
            assert_eq!(ctx.search_history().len(), i + 1);
        }
        let history = ctx.search_history();
        assert_eq!(history[0].query, "query 0");
        assert_eq!(history[3].query, "query 3");
        // The derived counter mirrors the array length.
        assert_eq!(ctx.get("search_count"), Some(&json!(4)));
    }

    #[test]
    fn test_last_decision_roundtrip() {
        let mut ctx = FlowContext::new("q");
        let decision = Decision {
            action: DecisionAction::Search,
            reasoning: "needs current data".into(),
            search_query: Some("latest rust release".into()),
            answer: None,
        };
        ctx.set_last_decision(&decision);
        assert_eq!(ctx.last_decision(), Some(decision));
    }

    #[test]
    fn test_final_answer_and_draft() {
        let mut ctx = FlowContext::new("q");
        assert!(ctx.draft_answer().is_none());
        ctx.set_draft_answer("42");
        assert_eq!(ctx.draft_answer().as_deref(), Some("42"));
        ctx.set_final_answer("forty-two");
        assert_eq!(ctx.final_answer(), Some("forty-two"));
    }
}
