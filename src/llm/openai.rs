use crate::llm::http::{build_client, send_json, trim_base_url};
use crate::llm::provider::TextProvider;
use crate::llm::types::{ProviderError, ProviderKind, TextRequest, TextResponse};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::debug;

const PROVIDER: ProviderKind = ProviderKind::OpenAI;
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// OpenAI chat completions adapter.
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            base_url: trim_base_url(base_url),
            api_key,
            default_model: model.to_string(),
            timeout,
        })
    }

    fn build_body(request: &TextRequest, model: &str) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_message {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        json!({
            "model": model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature.unwrap_or(0.7),
        })
    }

    fn parse_response(body: Value) -> Result<String, ProviderError> {
        let completion: ChatCompletion = serde_json::from_value(body)
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no choices returned"))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ProviderError::generation_failed(
                PROVIDER,
                "content blocked by content filter",
            ));
        }

        choice
            .message
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "choice has no message content"))
    }
}

impl TextProvider for OpenAIProvider {
    fn generate(&self, request: TextRequest) -> BoxFuture<'_, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            let model = request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone());

            debug!("OpenAI request {} using model {}", request.id, model);
            let started = Instant::now();

            let http_request = self
                .client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&Self::build_body(&request, &model));
            let body = send_json(PROVIDER, self.timeout, http_request).await?;
            let text = Self::parse_response(body)?;

            Ok(TextResponse {
                request_id: request.id,
                text,
                provider: PROVIDER,
                model,
                execution_time: started.elapsed(),
            })
        })
    }

    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_places_system_message_first() {
        let mut request = TextRequest::new("Suggest keywords");
        request.system_message = Some("You are an SEO analyst.".to_string());
        let body = OpenAIProvider::build_body(&request, "gpt-4");

        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Suggest keywords");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_parse_first_choice() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "Draft"}, "finish_reason": "stop"}]
        });
        assert_eq!(OpenAIProvider::parse_response(body).unwrap(), "Draft");
    }

    #[test]
    fn test_parse_rejects_missing_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert!(matches!(
            OpenAIProvider::parse_response(body),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }
}
