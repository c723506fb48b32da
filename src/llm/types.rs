use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Vendors that back the text and translation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    Anthropic,
    Replicate,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Replicate => "replicate",
        }
    }

    /// Accepts vendor names as well as the model aliases callers send
    /// (`gpt4`, `claude`, `google`, ...).
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return None;
        }

        if hint == "google" || hint.starts_with("gemini") {
            Some(ProviderKind::Gemini)
        } else if hint == "openai" || hint.starts_with("gpt") || hint == "chatgpt" {
            Some(ProviderKind::OpenAI)
        } else if hint == "anthropic" || hint.starts_with("claude") {
            Some(ProviderKind::Anthropic)
        } else if hint == "replicate" {
            Some(ProviderKind::Replicate)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image models reachable through the configured vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageModel {
    Flux,
    Midjourney,
    Dalle,
}

impl ImageModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageModel::Flux => "flux",
            ImageModel::Midjourney => "midjourney",
            ImageModel::Dalle => "dalle",
        }
    }

    /// Vendor whose credential the model needs.
    pub fn vendor(&self) -> ProviderKind {
        match self {
            ImageModel::Flux | ImageModel::Midjourney => ProviderKind::Replicate,
            ImageModel::Dalle => ProviderKind::OpenAI,
        }
    }

    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "flux" | "flux-schnell" => Some(ImageModel::Flux),
            "midjourney" | "openjourney" => Some(ImageModel::Midjourney),
            "dalle" | "dall-e" | "dall-e-3" | "dalle3" => Some(ImageModel::Dalle),
            _ => None,
        }
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized text generation request shared by every text adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub id: Uuid,
    pub prompt: String,
    pub system_message: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub model: Option<String>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for TextRequest {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: String::new(),
            system_message: None,
            max_tokens: None,
            temperature: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub request_id: Uuid,
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub execution_time: Duration,
}

/// Normalized image generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "512x512")]
    Square512,
    #[default]
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1024x768")]
    Landscape1024x768,
}

impl ImageSize {
    pub const SUPPORTED: [&'static str; 3] = ["512x512", "1024x1024", "1024x768"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square512 => "512x512",
            ImageSize::Square1024 => "1024x1024",
            ImageSize::Landscape1024x768 => "1024x768",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Square512 => (512, 512),
            ImageSize::Square1024 => (1024, 1024),
            ImageSize::Landscape1024x768 => (1024, 768),
        }
    }

    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            ImageSize::Square512 | ImageSize::Square1024 => "1:1",
            ImageSize::Landscape1024x768 => "4:3",
        }
    }
}

/// Generated image: a hosted URL, inline base64 data, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

/// Adapter-level failures. Vendor payloads are reduced to a readable message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: ProviderKind,
        status: u16,
        message: String,
    },
    #[error("{provider} request timed out after {seconds}s")]
    RequestTimeout { provider: ProviderKind, seconds: u64 },
    #[error("{provider} network error: {message}")]
    Network {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} generation failed: {message}")]
    GenerationFailed {
        provider: ProviderKind,
        message: String,
    },
    #[error("Image generation timed out after {attempts} polls")]
    PollTimeout { attempts: u32 },
    #[error("No provider available for {capability}")]
    NoProviderAvailable { capability: String },
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProviderError::RequestTimeout { .. } | ProviderError::PollTimeout { .. }
        )
    }

    pub fn malformed(provider: ProviderKind, message: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider,
            message: message.into(),
        }
    }

    pub fn generation_failed(provider: ProviderKind, message: impl Into<String>) -> Self {
        ProviderError::GenerationFailed {
            provider,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_hints() {
        assert_eq!(ProviderKind::from_hint("gpt4"), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::from_hint("Claude"), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::from_hint("google"), Some(ProviderKind::Gemini));
        assert_eq!(
            ProviderKind::from_hint("gemini-2.0-flash-exp"),
            Some(ProviderKind::Gemini)
        );
        assert_eq!(ProviderKind::from_hint("llama"), None);
        assert_eq!(ProviderKind::from_hint(""), None);
    }

    #[test]
    fn test_image_size_mapping() {
        let size: ImageSize = serde_json::from_str("\"1024x768\"").unwrap();
        assert_eq!(size, ImageSize::Landscape1024x768);
        assert_eq!(size.aspect_ratio(), "4:3");
        assert_eq!(ImageSize::default().as_str(), "1024x1024");
        assert!(serde_json::from_str::<ImageSize>("\"800x600\"").is_err());
    }

    #[test]
    fn test_timeout_errors_mention_timed_out() {
        let poll = ProviderError::PollTimeout { attempts: 30 };
        let request = ProviderError::RequestTimeout {
            provider: ProviderKind::Gemini,
            seconds: 30,
        };
        assert!(poll.is_timeout() && poll.to_string().contains("timed out"));
        assert!(request.is_timeout() && request.to_string().contains("timed out"));
    }
}
