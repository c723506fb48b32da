use crate::llm::http::{build_client, send_json, trim_base_url};
use crate::llm::provider::TextProvider;
use crate::llm::types::{ProviderError, ProviderKind, TextRequest, TextResponse};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::debug;

const PROVIDER: ProviderKind = ProviderKind::Gemini;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google Gemini `generateContent` adapter.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiProvider {
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

    fn build_body(request: &TextRequest) -> Value {
        let prompt = match &request.system_message {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };

        let safety_settings: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({"category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE"}))
            .collect();

        json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(0.7),
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": request.max_tokens.unwrap_or(8192),
            },
            "safetySettings": safety_settings,
        })
    }

    /// Extracts the generated text, treating safety blocks as failures.
    fn parse_response(body: Value) -> Result<String, ProviderError> {
        let response: GenerateContentResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no candidates returned"))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::generation_failed(
                PROVIDER,
                "content blocked by safety filters",
            ));
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::malformed(PROVIDER, "candidate has no text"));
        }

        Ok(text)
    }
}

impl TextProvider for GeminiProvider {
    fn generate(&self, request: TextRequest) -> BoxFuture<'_, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            let model = request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone());
            let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

            debug!("Gemini request {} using model {}", request.id, model);
            let started = Instant::now();

            let http_request = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&Self::build_body(&request));
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
    fn test_body_carries_generation_and_safety_settings() {
        let mut request = TextRequest::new("Write about coffee");
        request.system_message = Some("You are an SEO writer.".to_string());
        let body = GeminiProvider::build_body(&request);

        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("You are an SEO writer."));
        assert!(text.ends_with("Write about coffee"));
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_parse_joins_candidate_parts() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(GeminiProvider::parse_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_rejects_safety_block() {
        let body = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let err = GeminiProvider::parse_response(body).unwrap_err();
        assert!(err.to_string().contains("safety"));
    }

    #[test]
    fn test_parse_rejects_empty_candidates() {
        let err = GeminiProvider::parse_response(json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }
}
