//! Error types and result aliases for the tourmind library.
//!
//! This module defines the core error type [`TourmindError`] and the [`Result`] type alias
//! used throughout the library. Malformed model output is deliberately NOT represented
//! here: the reasoning parser is total and records parse problems as data on its result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TourmindError {
    #[error("reasoning gateway error: {0}")]
    GatewayError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::Error),

    #[error("tool error: {0}")]
    ToolError(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for TourmindError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TourmindError::Timeout(err.to_string())
        } else {
            TourmindError::HttpError(err)
        }
    }
}

impl TourmindError {
    /// True for faults caused by service overload rather than by a broken
    /// request. The synthesis path maps these to a distinct user-facing
    /// "system overloaded" message.
    pub fn is_overload(&self) -> bool {
        matches!(self, TourmindError::RateLimited(_) | TourmindError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TourmindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = TourmindError::GatewayError("connection refused".to_string());
        assert_eq!(err.to_string(), "reasoning gateway error: connection refused");
    }

    #[test]
    fn test_api_error_display() {
        let err = TourmindError::ApiError("invalid API key".to_string());
        assert_eq!(err.to_string(), "API error: invalid API key");
    }

    #[test]
    fn test_rate_limited_display() {
        let err = TourmindError::RateLimited("429 from upstream".to_string());
        assert_eq!(err.to_string(), "rate limited: 429 from upstream");
    }

    #[test]
    fn test_tool_error_display() {
        let err = TourmindError::ToolError("spatial index unavailable".to_string());
        assert_eq!(err.to_string(), "tool error: spatial index unavailable");
    }

    #[test]
    fn test_config_error_display() {
        let err = TourmindError::ConfigError("missing API key".to_string());
        assert_eq!(err.to_string(), "invalid configuration: missing API key");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: TourmindError = json_err.into();

        match err {
            TourmindError::SerializationError(_) => {}
            _ => panic!("Expected SerializationError"),
        }
    }

    #[test]
    fn test_overload_classification() {
        assert!(TourmindError::RateLimited("quota".to_string()).is_overload());
        assert!(TourmindError::Timeout("deadline".to_string()).is_overload());
        assert!(!TourmindError::ApiError("bad key".to_string()).is_overload());
        assert!(!TourmindError::ToolError("down".to_string()).is_overload());
    }

    #[test]
    fn test_error_debug() {
        let err = TourmindError::ToolError("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("ToolError"));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(TourmindError::ToolError("test".to_string()));
        assert!(err_result.is_err());
    }
}
