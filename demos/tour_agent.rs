//! Example demonstrating a full agent run against the in-memory toolkit.
//!
//! Uses the Gemini gateway when GEMINI_API_KEY is set; otherwise a canned
//! gateway replays a typical geocode -> spatial search -> finish run so the
//! loop can be watched offline.
//!
//! Run with: cargo run --example tour_agent

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tourmind::agent::AgentLoop;
use tourmind::llm::gateways::GeminiGateway;
use tourmind::llm::{GenerationConfig, ReasoningGateway};
use tourmind::prelude::*;
use tourmind::retrieval::InMemoryToolkit;

/// Replays a fixed reasoning script, for running the demo without a key.
struct CannedGateway {
    turns: Mutex<Vec<&'static str>>,
}

impl CannedGateway {
    fn new() -> Self {
        Self {
            turns: Mutex::new(vec![
                r#"{"thought": "I need coordinates for the beach first.", "action": "geocode_place", "action_input": {"name": "My Khe Beach"}}"#,
                r#"{"thought": "Now I can search for cafes around it.", "action": "spatial_nearby_search", "action_input": {"lat": 16.0614, "lng": 108.2459, "max_distance_km": 2.0, "category": "cafe", "limit": 5}}"#,
                r#"{"thought": "Two cafes found, that answers the query.", "action": "finish", "action_input": {}}"#,
                r#"{"response": "Right by My Khe Beach you have Cong Caphe (about 150m from the sand) and 43 Factory Coffee Roaster, both well rated.", "selected_place_ids": ["p-cong-caphe", "p-43-factory"]}"#,
            ]),
        }
    }
}

#[async_trait]
impl ReasoningGateway for CannedGateway {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        let mut turns = self.turns.lock().unwrap();
        if turns.is_empty() {
            return Ok(r#"{"thought": "nothing left", "action": "finish", "action_input": {}}"#
                .to_string());
        }
        Ok(turns.remove(0).to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("Tour Agent Example");
    println!("==================\n");

    let gateway: Arc<dyn ReasoningGateway> = match GeminiGateway::new() {
        Ok(gateway) => {
            println!("Using the Gemini gateway.\n");
            Arc::new(gateway)
        }
        Err(_) => {
            println!("GEMINI_API_KEY not set, replaying a canned run.\n");
            Arc::new(CannedGateway::new())
        }
    };

    let toolkit = Arc::new(InMemoryToolkit::seeded());
    let agent = AgentLoop::builder(gateway, toolkit)
        .max_steps(5)
        .generation_config(GenerationConfig::default().with_temperature(0.2))
        .build();

    let query = Query::new("find a cafe near My Khe beach");
    println!("User Query:\n{}\n\nProcessing...\n", query.text);

    let (answer, state) = agent.run(query, None).await;

    println!("{}", "=".repeat(50));
    println!("Agent Response:");
    println!("{}\n", answer);
    println!("Grounded place ids: {:?}", state.selected_place_ids);
    println!("Steps taken: {}", state.current_step());
    for step in &state.steps {
        println!("  {}. {}: {}", step.step_number, step.action, step.thought);
    }
    if let Some(elapsed) = state.elapsed {
        println!("Elapsed: {:?}", elapsed);
    }
    println!("{}", "=".repeat(50));

    Ok(())
}
