//! Total parsing of the model's reasoning and synthesis output.
//!
//! A generative model's output is never guaranteed well-formed, so every
//! entry point here is total: it always produces a usable result and records
//! what went wrong on the result itself. The salvage order is strict JSON,
//! then the inside of a fenced block, then the first-`{`-to-last-`}`
//! substring, then bare field extraction, and finally a safe finish.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// The closed set of retrieval tools the loop can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolAction {
    Geocode,
    SpatialNearby,
    SemanticSearch,
    VisualSearch,
    SocialSearch,
}

impl ToolAction {
    pub const ALL: [ToolAction; 5] = [
        ToolAction::Geocode,
        ToolAction::SpatialNearby,
        ToolAction::SemanticSearch,
        ToolAction::VisualSearch,
        ToolAction::SocialSearch,
    ];

    /// The name this tool goes by on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ToolAction::Geocode => "geocode_place",
            ToolAction::SpatialNearby => "spatial_nearby_search",
            ToolAction::SemanticSearch => "semantic_text_search",
            ToolAction::VisualSearch => "visual_similarity_search",
            ToolAction::SocialSearch => "social_media_search",
        }
    }

    pub fn from_wire(name: &str) -> Option<ToolAction> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        Self::ALL.iter().copied().find(|a| a.wire_name() == normalized)
    }

    /// One-line description rendered into the tool catalog.
    pub fn description(&self) -> &'static str {
        match self {
            ToolAction::Geocode => "Resolve a landmark or place name to lat/lng coordinates",
            ToolAction::SpatialNearby => {
                "Find places within a radius of known coordinates, optionally by category"
            }
            ToolAction::SemanticSearch => {
                "Find places whose descriptions match a free-text query"
            }
            ToolAction::VisualSearch => {
                "Find places that look like the user's reference image"
            }
            ToolAction::SocialSearch => "Find recent social media posts about a topic",
        }
    }

    /// Compact parameter hint rendered into the tool catalog.
    pub fn parameters_hint(&self) -> &'static str {
        match self {
            ToolAction::Geocode => r#"{"name": "<place name>"}"#,
            ToolAction::SpatialNearby => {
                r#"{"lat": <num>, "lng": <num>, "max_distance_km": <num>, "category": "<optional>", "limit": <num>}"#
            }
            ToolAction::SemanticSearch => r#"{"query": "<text>", "limit": <num>}"#,
            ToolAction::VisualSearch => r#"{"limit": <num>}"#,
            ToolAction::SocialSearch => {
                r#"{"query": "<text>", "limit": <num>, "freshness": "day|week|month"}"#
            }
        }
    }
}

/// What the model decided to do next: call one tool, or finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    Tool(ToolAction),
    Finish,
}

impl AgentAction {
    pub fn wire_name(&self) -> &'static str {
        match self {
            AgentAction::Tool(tool) => tool.wire_name(),
            AgentAction::Finish => "finish",
        }
    }
}

/// The structured object the model is asked to emit each reasoning turn.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReasoningDecision {
    /// The reasoning behind the chosen action
    #[serde(default)]
    pub thought: String,
    /// One tool name, or "finish"
    #[serde(default)]
    pub action: String,
    /// Arguments for the chosen tool
    #[serde(default)]
    pub action_input: HashMap<String, Value>,
}

/// The structured object the model is asked to emit for the final answer.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SynthesisReply {
    /// The answer text shown to the user
    #[serde(default)]
    pub response: String,
    /// Identifiers of the places the answer relies on
    #[serde(default)]
    pub selected_place_ids: Vec<String>,
}

/// A reasoning turn after parsing, consumed immediately by the controller.
#[derive(Debug, Clone)]
pub struct ReasoningResult {
    pub thought: String,
    pub action: AgentAction,
    pub action_input: Value,
    pub raw_response: String,
    pub parse_error: Option<String>,
}

/// A synthesis turn after parsing.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub response: String,
    pub selected_place_ids: Vec<String>,
    pub parse_error: Option<String>,
}

/// The content inside the first fenced block, if any.
///
/// Tolerates a language tag after the opening fence (such as ```json).
pub(crate) fn extract_fenced(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// The substring between the first `{` and the last `}`, inclusive.
pub(crate) fn brace_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Salvage a JSON object from free text: strict, then fenced, then braces.
pub(crate) fn salvage_json(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        if value.is_object() {
            return Some(value);
        }
    }
    if let Some(inner) = extract_fenced(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    if let Some(candidate) = brace_slice(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    None
}

/// Pull `thought` and `action` out of text that JSON decoding gave up on.
pub(crate) fn extract_fields(raw: &str) -> (Option<String>, Option<String>) {
    let field = |name: &str| -> Option<String> {
        let pattern = format!(r#"(?i)"?{}"?\s*[:=]\s*"([^"]*)""#, name);
        Regex::new(&pattern)
            .ok()?
            .captures(raw)
            .map(|caps| caps[1].to_string())
    };
    (field("thought"), field("action"))
}

fn resolve_action(name: &str) -> (AgentAction, Option<String>) {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("finish") {
        return (AgentAction::Finish, None);
    }
    match ToolAction::from_wire(trimmed) {
        Some(tool) => (AgentAction::Tool(tool), None),
        None => (
            AgentAction::Finish,
            Some(format!("unknown action: {}", trimmed)),
        ),
    }
}

/// Parse one reasoning turn. Total: never fails, never returns an empty action.
pub fn parse_reasoning(raw: &str) -> ReasoningResult {
    if let Some(value) = salvage_json(raw) {
        if let Ok(decision) = serde_json::from_value::<ReasoningDecision>(value) {
            let (action, parse_error) = resolve_action(&decision.action);
            return ReasoningResult {
                thought: decision.thought,
                action,
                action_input: serde_json::to_value(decision.action_input)
                    .unwrap_or_else(|_| Value::Object(Default::default())),
                raw_response: raw.to_string(),
                parse_error,
            };
        }
    }

    debug!("Reasoning output not decodable as JSON, falling back to field extraction");
    let (thought, action_name) = extract_fields(raw);
    let (action, action_error) = match action_name {
        Some(name) => resolve_action(&name),
        None => (AgentAction::Finish, None),
    };

    ReasoningResult {
        thought: thought.unwrap_or_default(),
        action,
        action_input: Value::Object(Default::default()),
        raw_response: raw.to_string(),
        parse_error: Some(
            action_error.unwrap_or_else(|| "unstructured reasoning output".to_string()),
        ),
    }
}

/// Parse one synthesis turn. Total: on failure the raw text becomes the
/// answer and no place identifiers are claimed.
pub fn parse_synthesis(raw: &str) -> SynthesisResult {
    if let Some(value) = salvage_json(raw) {
        if let Ok(reply) = serde_json::from_value::<SynthesisReply>(value) {
            if !reply.response.is_empty() || !reply.selected_place_ids.is_empty() {
                return SynthesisResult {
                    response: reply.response,
                    selected_place_ids: reply.selected_place_ids,
                    parse_error: None,
                };
            }
        }
    }

    SynthesisResult {
        response: raw.trim().to_string(),
        selected_place_ids: Vec::new(),
        parse_error: Some("unstructured synthesis output".to_string()),
    }
}
