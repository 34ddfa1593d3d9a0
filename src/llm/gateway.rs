use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Configuration for one text-generation round trip.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    /// Standing instruction sent alongside the prompt, when the provider
    /// supports one.
    pub system_instruction: Option<String>,
    /// Hard deadline for the round trip. The loop controller never blocks
    /// past this.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            system_instruction: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Abstract interface to the text-generation service.
///
/// The agent loop depends on exactly this round trip; transport faults
/// (timeout, rate limit, auth) come back as typed errors, never panics.
#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_default() {
        let config = GenerationConfig::default();

        assert_eq!(config.temperature, 0.2);
        assert!(config.system_instruction.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_generation_config_builders() {
        let config = GenerationConfig::default()
            .with_temperature(0.7)
            .with_system_instruction("You are a travel assistant.")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.temperature, 0.7);
        assert_eq!(
            config.system_instruction.as_deref(),
            Some("You are a travel assistant.")
        );
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_generation_config_clone() {
        let config1 = GenerationConfig::default().with_temperature(0.5);
        let config2 = config1.clone();

        assert_eq!(config1.temperature, config2.temperature);
        assert_eq!(config1.timeout, config2.timeout);
    }
}
