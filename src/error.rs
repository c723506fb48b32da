//! Error taxonomy for tool execution.
//!
//! Every failure inside [`ServiceManager::execute_tool`](crate::ServiceManager::execute_tool)
//! ends up as one of these variants and is rendered into the response
//! envelope; none of them escapes the orchestrator boundary.

use crate::llm::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// No credential satisfies the request.
    #[error("{0}")]
    Configuration(String),
    /// A vendor or upstream site returned an error or an unusable payload.
    #[error("{0}")]
    Provider(String),
    /// A bounded wait was exceeded.
    #[error("{0}")]
    Timeout(String),
    /// Unknown tool or bad arguments; raised before any network call.
    #[error("{0}")]
    Validation(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Service manager not initialized")]
    NotInitialized,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured counterpart of [`ServiceError`] carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigurationError,
    ProviderError,
    Timeout,
    ValidationError,
    RateLimited,
    NotInitialized,
    InternalError,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Configuration(_) => ErrorCode::ConfigurationError,
            ServiceError::Provider(_) => ErrorCode::ProviderError,
            ServiceError::Timeout(_) => ErrorCode::Timeout,
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::RateLimited(_) => ErrorCode::RateLimited,
            ServiceError::NotInitialized => ErrorCode::NotInitialized,
            ServiceError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn missing_argument(name: &str) -> Self {
        ServiceError::Validation(format!("Missing required argument: {}", name))
    }

    pub fn unknown_tool(name: &str) -> Self {
        ServiceError::Validation(format!("Unknown tool: {}", name))
    }

    pub fn no_provider(capability: &str) -> Self {
        ServiceError::Configuration(format!("No provider available for {}", capability))
    }
}

impl From<ProviderError> for ServiceError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NoProviderAvailable { .. } => {
                ServiceError::Configuration(error.to_string())
            }
            ref e if e.is_timeout() => ServiceError::Timeout(error.to_string()),
            _ => ServiceError::Provider(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::Internal(format!("Failed to serialize result: {}", error))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::NotInitialized => "NOT_INITIALIZED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(code)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
