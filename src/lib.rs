pub mod agent;
pub mod error;
pub mod llm;
pub mod retrieval;

pub use error::{Result, TourmindError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::{AgentLoop, AgentState, Query, RunStatus, ToolAction};
    pub use crate::error::{Result, TourmindError};
    pub use crate::llm::gateways::GeminiGateway;
    pub use crate::llm::{GenerationConfig, ReasoningGateway};
    pub use crate::retrieval::{GeoPoint, PlaceRecord, RetrievalToolkit, SocialPost};
}
