pub mod gateway;
pub mod gateways;

pub use gateway::{GenerationConfig, ReasoningGateway};
