//! Shared HTTP plumbing for the vendor adapters.
//!
//! Every adapter funnels its calls through [`send_json`], which bounds the call
//! with the client's timeout and reduces vendor error payloads to a single
//! readable message. Raw response bodies are never surfaced.

use crate::env::endpoints::USER_AGENT;
use crate::llm::types::{ProviderError, ProviderKind};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_MESSAGE_CHARS: usize = 300;

pub fn build_client(provider: ProviderKind, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Network {
            provider,
            message: format!("failed to build HTTP client: {}", e),
        })
}

pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Sends `request` and returns the decoded JSON body of a successful response.
pub async fn send_json(
    provider: ProviderKind,
    timeout: Duration,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, timeout, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, timeout, e))?;

    if !status.is_success() {
        let message = extract_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::malformed(provider, format!("invalid JSON body: {}", e)))
}

fn transport_error(provider: ProviderKind, timeout: Duration, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::RequestTimeout {
            provider,
            seconds: timeout.as_secs(),
        }
    } else {
        ProviderError::Network {
            provider,
            message: error.without_url().to_string(),
        }
    }
}

/// Pulls a human-readable message out of the error shapes used by the vendors.
///
/// Gemini, OpenAI and Anthropic nest it under `error.message`; Replicate uses
/// `detail`; WordPress uses `message`. Non-JSON bodies yield `None`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .or_else(|| value.get("detail").and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))
        .or_else(|| value.get("title").and_then(Value::as_str))?
        .trim();

    if message.is_empty() {
        return None;
    }

    Some(message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect())
}
