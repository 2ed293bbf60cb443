use tracing::debug;

use quester_core::types::Decision;

/// Extract the body of the first ```yaml fenced block in oracle output.
pub fn extract_fenced_yaml(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("```yaml")?;
    let (block, _) = rest.split_once("```")?;
    Some(block.trim())
}

/// Parse a decision from raw oracle output.
///
/// Parse and validation failures are not errors: they yield the
/// deterministic fallback (search for the original question), so the loop
/// always has a legal next step.
pub fn parse_decision(text: &str, question: &str) -> Decision {
    let Some(block) = extract_fenced_yaml(text) else {
        debug!("No fenced yaml block in oracle output, using fallback decision");
        return Decision::fallback(question, "no fenced yaml block in response");
    };

    match serde_yaml::from_str::<Decision>(block) {
        Ok(decision) if decision.is_valid() => decision,
        Ok(_) => {
            debug!("Decision failed validation, using fallback");
            Decision::fallback(question, "decision failed validation")
        }
        Err(e) => {
            debug!(error = %e, "Decision yaml did not parse, using fallback");
            Decision::fallback(question, format!("failed to parse decision: {e}"))
        }
    }
}
