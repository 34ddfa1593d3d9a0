//! The agent orchestration core.
//!
//! A bounded ReAct loop: each step builds a prompt from the run's state,
//! asks the reasoning engine what to do, parses the decision, dispatches
//! one retrieval tool, and records the observation. A final synthesis turn
//! produces the answer together with the grounded place identifiers.
//!
//! # Components
//!
//! - **state**: the per-run append-only step log and context map
//! - **parser**: total parsing of the model's wire output
//! - **prompt**: deterministic prompt construction with compact summaries
//! - **dispatcher**: the closed tool dispatch table
//! - **controller**: the bounded loop and failure containment
//! - **synthesizer**: the grounded final answer

pub mod controller;
pub mod dispatcher;
pub mod parser;
pub mod prompt;
pub mod state;
pub mod synthesizer;

pub use controller::{AgentLoop, AgentLoopBuilder, DEGRADED_RUN_MESSAGE, OVERLOADED_MESSAGE};
pub use dispatcher::{Dispatcher, Observation};
pub use parser::{
    parse_reasoning, parse_synthesis, AgentAction, ReasoningDecision, ReasoningResult,
    SynthesisReply, SynthesisResult, ToolAction,
};
pub use prompt::{build_step_prompt, build_synthesis_prompt, summarize_observation};
pub use state::{AgentState, Query, RunStatus, Step};
pub use synthesizer::synthesize;
