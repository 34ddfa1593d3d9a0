//! Prompt construction for the reasoning and synthesis calls.
//!
//! Everything here is pure and deterministic. Prior observations are
//! rendered as compact per-tool summaries rather than raw payloads, so
//! prompt size stays bounded across steps and the model is steered away
//! from repeating tools it already has results from.

use crate::agent::dispatcher::Observation;
use crate::agent::parser::{ReasoningDecision, SynthesisReply, ToolAction};
use crate::agent::state::AgentState;

const MAX_SUMMARY_ITEMS: usize = 8;

/// Render the closed tool catalog: names, descriptions, parameter hints.
pub fn format_tool_catalog() -> String {
    let mut output = "Tools available:\n".to_string();
    for action in ToolAction::ALL {
        output.push_str(&format!(
            "- {}: {}\n  Input: {}\n",
            action.wire_name(),
            action.description(),
            action.parameters_hint()
        ));
    }
    output
}

/// Compact one-line-per-item summary of an observation, shaped per tool.
pub fn summarize_observation(action: ToolAction, observation: &Observation) -> String {
    match observation {
        Observation::Location(point) => {
            format!("coordinates: lat {:.4}, lng {:.4}", point.lat, point.lng)
        }
        Observation::Places(records) => {
            if records.is_empty() {
                return "no places found".to_string();
            }
            let mut output = format!("{} place(s):\n", records.len());
            for (i, record) in records.iter().take(MAX_SUMMARY_ITEMS).enumerate() {
                let mut line = format!(
                    "  {}. {} ({}, id {}",
                    i + 1,
                    record.name,
                    record.category,
                    record.place_id
                );
                if let Some(distance) = record.distance_km {
                    line.push_str(&format!(", {:.2} km", distance));
                }
                if let Some(rating) = record.rating {
                    line.push_str(&format!(", rating {:.1}", rating));
                }
                if action == ToolAction::VisualSearch {
                    if let Some(similarity) = record.similarity {
                        line.push_str(&format!(", similarity {:.2}", similarity));
                    }
                }
                line.push_str(")\n");
                output.push_str(&line);
            }
            output.trim_end().to_string()
        }
        Observation::Social(posts) => {
            if posts.is_empty() {
                return "no posts found".to_string();
            }
            let mut output = format!("{} post(s):\n", posts.len());
            for (i, post) in posts.iter().take(MAX_SUMMARY_ITEMS).enumerate() {
                output.push_str(&format!(
                    "  {}. {} ({}, {})\n",
                    i + 1,
                    post.title,
                    post.platform,
                    post.age
                ));
            }
            output.trim_end().to_string()
        }
        Observation::Error { error } => format!("error: {}", error),
    }
}

fn format_step_history(state: &AgentState) -> String {
    if state.steps.is_empty() {
        return "No steps have yet been taken.\n".to_string();
    }

    let mut output = "What's been done so far:\n".to_string();
    for step in &state.steps {
        output.push_str(&format!(
            "{}.\n    Thought: {}\n    Action: {}\n",
            step.step_number, step.thought, step.action
        ));
        if let Some(observation) = &step.observation {
            let summary = ToolAction::from_wire(&step.action)
                .map(|tool| summarize_observation(tool, observation))
                .unwrap_or_else(|| "(unavailable)".to_string());
            output.push_str(&format!("    Result: {}\n", summary));
        }
    }
    output
}

fn format_context_digest(state: &AgentState) -> String {
    if state.context.is_empty() {
        return String::new();
    }

    let mut output = "Latest results per tool:\n".to_string();
    // Deterministic order regardless of map iteration
    for action in ToolAction::ALL {
        if let Some(observation) = state.context.get(&action) {
            output.push_str(&format!(
                "- {}: {}\n",
                action.wire_name(),
                summarize_observation(action, observation)
            ));
        }
    }
    output
}

fn wire_shape<T: schemars::JsonSchema>() -> String {
    serde_json::to_string(&schemars::schema_for!(T))
        .unwrap_or_else(|_| "{}".to_string())
}

/// Build the prompt for the next reasoning turn.
pub fn build_step_prompt(state: &AgentState) -> String {
    let image_note = if state.query.image_ref.is_some() {
        "The user attached a reference image; visual_similarity_search can use it.\n"
    } else {
        ""
    };

    format!(
        "You are a tourism assistant for Da Nang. Answer the user's query by \
         choosing one tool at a time.\n\n\
         The user has asked:\n> {query}\n{image_note}\n\
         {catalog}\n\
         {history}\n\
         {context}\n\
         Decide the next action. Do NOT call a tool again if its latest \
         results above already give you what you need; finish instead. \
         When you have enough information, respond with action \"finish\".\n\n\
         Respond with ONLY one JSON object matching this schema:\n{schema}\n\n\
         Example: {{\"thought\": \"...\", \"action\": \"geocode_place\", \
         \"action_input\": {{\"name\": \"My Khe Beach\"}}}}",
        query = state.query.text,
        image_note = image_note,
        catalog = format_tool_catalog(),
        history = format_step_history(state),
        context = format_context_digest(state),
        schema = wire_shape::<ReasoningDecision>(),
    )
}

/// Build the prompt for the final synthesis turn.
pub fn build_synthesis_prompt(state: &AgentState, history: Option<&str>) -> String {
    let conversation = history
        .map(|block| format!("Earlier conversation:\n{}\n\n", block))
        .unwrap_or_default();

    let gathered = if state.has_results() {
        format_step_history(state)
    } else {
        "No information was gathered for this query. Say so plainly and do \
         not invent places.\n"
            .to_string()
    };

    let grounding = {
        let mut ids: Vec<String> = state.place_ids_observed().into_iter().collect();
        ids.sort();
        if ids.is_empty() {
            "There are no candidate places; selected_place_ids must be empty.\n".to_string()
        } else {
            format!(
                "Candidate place ids (choose ONLY from these): {}\n",
                ids.join(", ")
            )
        }
    };

    format!(
        "You are a tourism assistant for Da Nang. Write the final answer to \
         the user's query using only the information gathered below.\n\n\
         {conversation}\
         The user has asked:\n> {query}\n\n\
         {gathered}\n\
         {grounding}\n\
         Respond with ONLY one JSON object matching this schema:\n{schema}",
        conversation = conversation,
        query = state.query.text,
        gathered = gathered,
        grounding = grounding,
        schema = wire_shape::<SynthesisReply>(),
    )
}
