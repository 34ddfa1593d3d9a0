use crate::error::{Result, TourmindError};
use crate::llm::gateway::{GenerationConfig, ReasoningGateway};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Configuration for connecting to a Gemini-style generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("GEMINI_HOST")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
        }
    }
}

/// Gateway for Google's Gemini text-generation API.
///
/// Maps upstream failure statuses onto the crate's fault taxonomy so the
/// loop controller can tell overload (429, deadline) apart from broken
/// requests (auth, bad payload).
pub struct GeminiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    /// Create a new Gemini gateway from environment configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(GeminiConfig::default())
    }

    /// Create a new Gemini gateway with custom configuration.
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(TourmindError::ConfigError(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| TourmindError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host, self.config.model
        )
    }

    fn build_body(prompt: &str, config: &GenerationConfig) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": config.temperature
            }
        });

        if let Some(instruction) = &config.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": instruction }]
            });
        }

        body
    }

    fn extract_text(body: &Value) -> Result<String> {
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                TourmindError::GatewayError("response contained no candidate text".to_string())
            })
    }
}

#[async_trait]
impl ReasoningGateway for GeminiGateway {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        info!(model = %self.config.model, "Delegating to Gemini for generation");
        debug!(prompt_chars = prompt.len(), "Prompt assembled");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .timeout(config.timeout)
            .json(&Self::build_body(prompt, config))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => TourmindError::RateLimited(format!("Gemini API: {}", detail)),
                401 | 403 => TourmindError::ApiError(format!("Gemini auth failure: {}", detail)),
                _ => TourmindError::GatewayError(format!("Gemini API error {}: {}", status, detail)),
            });
        }

        let response_body: Value = response.json().await?;
        Self::extract_text(&response_body)
    }
}
