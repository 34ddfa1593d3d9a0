//! Final-answer synthesis over a completed run.
//!
//! One extra reasoning round trip turns the run's observations into the
//! answer text and the set of place identifiers it relies on. The grounding
//! rule is absolute: an identifier the tools never returned is silently
//! dropped, so the system cannot assert the existence of a place no tool
//! actually produced.

use crate::agent::parser::parse_synthesis;
use crate::agent::prompt::build_synthesis_prompt;
use crate::agent::state::AgentState;
use crate::error::Result;
use crate::llm::{GenerationConfig, ReasoningGateway};
use std::collections::HashSet;
use tracing::{info, warn};

/// Produce the final answer and the grounded place identifiers for a run.
///
/// Transport faults from the gateway propagate; the controller maps overload
/// faults to its distinct degraded message. Parse failures do not propagate:
/// the raw model text becomes the answer and no identifiers are claimed.
pub async fn synthesize(
    gateway: &dyn ReasoningGateway,
    config: &GenerationConfig,
    state: &AgentState,
    history: Option<&str>,
) -> Result<(String, Vec<String>)> {
    let grounding_set = state.place_ids_observed();
    let prompt = build_synthesis_prompt(state, history);

    let raw = gateway.generate(&prompt, config).await?;
    let result = parse_synthesis(&raw);

    if let Some(parse_error) = &result.parse_error {
        warn!(
            run_id = %state.run_id,
            parse_error = parse_error.as_str(),
            "Synthesis output not structured, using raw text"
        );
        return Ok((result.response, Vec::new()));
    }

    let grounded_ids = filter_grounded(result.selected_place_ids, &grounding_set, state);
    info!(
        run_id = %state.run_id,
        grounded = grounded_ids.len(),
        "Synthesis complete"
    );
    Ok((result.response, grounded_ids))
}

/// Keep only identifiers present in the grounding set, preserving order and
/// dropping duplicates.
fn filter_grounded(
    proposed: Vec<String>,
    grounding_set: &HashSet<String>,
    state: &AgentState,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut grounded = Vec::new();

    for id in proposed {
        if !grounding_set.contains(&id) {
            warn!(run_id = %state.run_id, place_id = id.as_str(), "Dropping ungrounded place id from synthesis");
            continue;
        }
        if seen.insert(id.clone()) {
            grounded.push(id);
        }
    }
    grounded
}
