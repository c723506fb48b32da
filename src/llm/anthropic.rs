use crate::env::endpoints::ANTHROPIC_VERSION;
use crate::llm::http::{build_client, send_json, trim_base_url};
use crate::llm::provider::TextProvider;
use crate::llm::types::{ProviderError, ProviderKind, TextRequest, TextResponse};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::debug;

const PROVIDER: ProviderKind = ProviderKind::Anthropic;
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Anthropic messages API adapter.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicProvider {
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
        let mut body = json!({
            "model": model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(system) = &request.system_message {
            body["system"] = json!(system);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    fn parse_response(body: Value) -> Result<String, ProviderError> {
        let response: MessagesResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            let reason = response.stop_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::malformed(
                PROVIDER,
                format!("no text content (stop reason: {})", reason),
            ));
        }

        Ok(text)
    }
}

impl TextProvider for AnthropicProvider {
    fn generate(&self, request: TextRequest) -> BoxFuture<'_, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            let model = request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone());

            debug!("Anthropic request {} using model {}", request.id, model);
            let started = Instant::now();

            let http_request = self
                .client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
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
