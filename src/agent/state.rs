//! Per-run agent state: the append-only step log and its bookkeeping.
//!
//! One [`AgentState`] exists per inbound query, is mutated only by the loop
//! controller, and is dropped when the request completes. Nothing here is
//! ever persisted.

use crate::agent::dispatcher::Observation;
use crate::agent::parser::{AgentAction, ToolAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use uuid::Uuid;

/// The run's entry point: the user's question plus an optional image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Complete,
    Errored,
}

/// One completed iteration of the loop. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    /// 1-based position in the run
    pub step_number: usize,
    pub thought: String,
    pub action: String,
    pub action_input: Value,
    /// Absent on the terminal finish step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

/// In-memory record of one run.
///
/// `steps` is an append-only log; `context` holds each tool's most recent
/// observation (last write wins) and feeds prompt construction only. A Step
/// owns its own copy of its observation, never an alias into `context`.
#[derive(Debug)]
pub struct AgentState {
    pub run_id: Uuid,
    pub query: Query,
    pub steps: Vec<Step>,
    pub context: HashMap<ToolAction, Observation>,
    pub max_steps: usize,
    pub status: RunStatus,
    pub final_answer: Option<String>,
    pub selected_place_ids: Vec<String>,
    pub error: Option<String>,
    pub elapsed: Option<Duration>,
}

impl AgentState {
    pub fn new(query: Query, max_steps: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query,
            steps: Vec::new(),
            context: HashMap::new(),
            max_steps,
            status: RunStatus::Running,
            final_answer: None,
            selected_place_ids: Vec::new(),
            error: None,
            elapsed: None,
        }
    }

    /// Number of steps taken so far. Always equals `steps.len()`.
    pub fn current_step(&self) -> usize {
        self.steps.len()
    }

    pub fn is_complete(&self) -> bool {
        self.status != RunStatus::Running
    }

    /// Append one step, copying its observation into the context map.
    ///
    /// No-op once the run has left the running state.
    pub fn record_step(
        &mut self,
        thought: impl Into<String>,
        action: &AgentAction,
        action_input: Value,
        observation: Option<Observation>,
        duration: Duration,
    ) {
        debug_assert!(
            self.status == RunStatus::Running,
            "step appended to a finished run"
        );
        if self.is_complete() {
            return;
        }

        if let (AgentAction::Tool(tool), Some(obs)) = (action, &observation) {
            self.context.insert(*tool, obs.clone());
        }

        self.steps.push(Step {
            step_number: self.steps.len() + 1,
            thought: thought.into(),
            action: action.wire_name().to_string(),
            action_input,
            observation,
            duration,
            timestamp: Utc::now(),
        });
    }

    pub fn mark_complete(&mut self) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Complete;
        }
    }

    /// Record a fault. The status transition only applies to a running run;
    /// a run that already completed keeps its terminal status and just
    /// carries the fault message.
    pub fn mark_errored(&mut self, message: impl Into<String>) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Errored;
        }
        self.error = Some(message.into());
    }

    pub fn set_final_answer(&mut self, answer: impl Into<String>, place_ids: Vec<String>) {
        self.final_answer = Some(answer.into());
        self.selected_place_ids = place_ids;
    }

    pub fn record_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
    }

    /// The grounding set: every place identifier seen in any observation
    /// recorded during this run.
    pub fn place_ids_observed(&self) -> HashSet<String> {
        self.steps
            .iter()
            .filter_map(|step| step.observation.as_ref())
            .flat_map(|obs| obs.place_ids().into_iter().map(String::from))
            .collect()
    }

    /// True if any step produced a non-error observation.
    pub fn has_results(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(&step.observation, Some(obs) if !obs.is_error()))
    }
}
