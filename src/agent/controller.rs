//! The bounded reason-act-observe loop.
//!
//! One [`AgentLoop`] serves many concurrent runs; each run is strictly
//! sequential because every step's prompt depends on the previous step's
//! observation. `max_steps` is the sole resource knob: a run makes at most
//! `2 * max_steps + 1` network round trips (reasoning + tool calls + one
//! synthesis call), enforced even when the model never chooses to finish.

use crate::agent::dispatcher::Dispatcher;
use crate::agent::parser::{parse_reasoning, AgentAction};
use crate::agent::prompt::build_step_prompt;
use crate::agent::state::{AgentState, Query};
use crate::agent::synthesizer::synthesize;
use crate::error::TourmindError;
use crate::llm::{GenerationConfig, ReasoningGateway};
use crate::retrieval::RetrievalToolkit;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Returned when a transport or dispatch fault ends the run early.
pub const DEGRADED_RUN_MESSAGE: &str =
    "Sorry, something went wrong while researching your request. Please try again in a moment.";

/// Returned when the synthesis call itself hits a rate limit or deadline.
pub const OVERLOADED_MESSAGE: &str =
    "The service is handling a lot of requests right now. Please try again shortly.";

const DEFAULT_MAX_STEPS: usize = 5;

/// The loop controller: composes prompt building, reasoning, parsing,
/// dispatch, and synthesis into one bounded run per query.
pub struct AgentLoop {
    gateway: Arc<dyn ReasoningGateway>,
    toolkit: Arc<dyn RetrievalToolkit>,
    max_steps: usize,
    config: GenerationConfig,
}

impl AgentLoop {
    pub fn new(gateway: Arc<dyn ReasoningGateway>, toolkit: Arc<dyn RetrievalToolkit>) -> Self {
        Self::builder(gateway, toolkit).build()
    }

    pub fn builder(
        gateway: Arc<dyn ReasoningGateway>,
        toolkit: Arc<dyn RetrievalToolkit>,
    ) -> AgentLoopBuilder {
        AgentLoopBuilder::new(gateway, toolkit)
    }

    /// Run one query to completion.
    ///
    /// Always returns a complete response: faults are contained and mapped
    /// to fixed degraded messages, never surfaced to the caller. `history`
    /// is a pre-formatted conversation block inserted verbatim into the
    /// synthesis prompt.
    pub async fn run(&self, query: Query, history: Option<&str>) -> (String, AgentState) {
        let started = Instant::now();
        let mut state = AgentState::new(query, self.max_steps);
        let dispatcher = Dispatcher::new(Arc::clone(&self.toolkit));

        info!(run_id = %state.run_id, query = state.query.text.as_str(), "Starting agent run");

        while state.current_step() < state.max_steps && !state.is_complete() {
            let prompt = build_step_prompt(&state);
            let step_started = Instant::now();

            let raw = match self.gateway.generate(&prompt, &self.config).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(run_id = %state.run_id, error = %e, "Reasoning call failed, ending run");
                    state.mark_errored(e.to_string());
                    break;
                }
            };

            let decision = parse_reasoning(&raw);
            if let Some(parse_error) = &decision.parse_error {
                warn!(
                    run_id = %state.run_id,
                    parse_error = parse_error.as_str(),
                    "Reasoning output degraded, recovered by parser"
                );
            }

            match decision.action {
                AgentAction::Finish => {
                    info!(run_id = %state.run_id, step = state.current_step() + 1, "Model chose to finish");
                    state.record_step(
                        decision.thought,
                        &AgentAction::Finish,
                        decision.action_input,
                        None,
                        step_started.elapsed(),
                    );
                    state.mark_complete();
                }
                AgentAction::Tool(tool) => {
                    // Tool signatures carry no deadline of their own, so the
                    // bound lives here: a hung backend elapses like any other
                    // dispatch fault.
                    let dispatched = tokio::time::timeout(
                        self.config.timeout,
                        dispatcher.execute(tool, &decision.action_input, &state.query),
                    )
                    .await
                    .unwrap_or_else(|_| {
                        Err(TourmindError::Timeout(format!(
                            "tool {} exceeded {:?}",
                            tool.wire_name(),
                            self.config.timeout
                        )))
                    });
                    match dispatched {
                        Ok(observation) => {
                            state.record_step(
                                decision.thought,
                                &AgentAction::Tool(tool),
                                decision.action_input,
                                Some(observation),
                                step_started.elapsed(),
                            );
                        }
                        Err(e) => {
                            // An environment fault, not a bad model decision.
                            // Not retried within this loop.
                            warn!(run_id = %state.run_id, error = %e, "Dispatch fault, ending run");
                            state.mark_errored(e.to_string());
                        }
                    }
                }
            }
        }

        // Step budget exhausted without an explicit finish
        if !state.is_complete() {
            info!(run_id = %state.run_id, max_steps = state.max_steps, "Step budget reached");
            state.mark_complete();
        }

        let (answer, place_ids) = if state.error.is_some() {
            (DEGRADED_RUN_MESSAGE.to_string(), Vec::new())
        } else {
            match synthesize(self.gateway.as_ref(), &self.config, &state, history).await {
                Ok(result) => result,
                Err(e) if e.is_overload() => {
                    warn!(run_id = %state.run_id, error = %e, "Synthesis overloaded");
                    (OVERLOADED_MESSAGE.to_string(), Vec::new())
                }
                Err(e) => {
                    warn!(run_id = %state.run_id, error = %e, "Synthesis failed");
                    state.mark_errored(e.to_string());
                    (DEGRADED_RUN_MESSAGE.to_string(), Vec::new())
                }
            }
        };

        state.set_final_answer(answer.clone(), place_ids);
        state.record_elapsed(started.elapsed());
        info!(
            run_id = %state.run_id,
            steps = state.current_step(),
            elapsed_ms = state.elapsed.map(|d| d.as_millis() as u64).unwrap_or(0),
            "Agent run finished"
        );

        (answer, state)
    }
}

/// Builder for an [`AgentLoop`].
pub struct AgentLoopBuilder {
    gateway: Arc<dyn ReasoningGateway>,
    toolkit: Arc<dyn RetrievalToolkit>,
    max_steps: usize,
    config: GenerationConfig,
}

impl AgentLoopBuilder {
    fn new(gateway: Arc<dyn ReasoningGateway>, toolkit: Arc<dyn RetrievalToolkit>) -> Self {
        Self {
            gateway,
            toolkit,
            max_steps: DEFAULT_MAX_STEPS,
            config: GenerationConfig::default(),
        }
    }

    /// Cap on loop iterations per run (default: 5).
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn generation_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AgentLoop {
        AgentLoop {
            gateway: self.gateway,
            toolkit: self.toolkit,
            max_steps: self.max_steps,
            config: self.config,
        }
    }
}
