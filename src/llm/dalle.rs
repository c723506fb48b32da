use crate::llm::http::{build_client, send_json, trim_base_url};
use crate::llm::provider::ImageProvider;
use crate::llm::types::{ImageModel, ImageOutput, ImageRequest, ImageSize, ProviderError, ProviderKind};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const PROVIDER: ProviderKind = ProviderKind::OpenAI;

/// OpenAI image generation adapter. Synchronous: one call returns the image.
pub struct DalleProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

impl DalleProvider {
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
            model: model.to_string(),
            timeout,
        })
    }

    /// dall-e-3 only renders 1024x1024 among the sizes callers may request.
    fn vendor_size(&self, size: ImageSize) -> &'static str {
        if self.model == "dall-e-3" {
            ImageSize::Square1024.as_str()
        } else {
            size.as_str()
        }
    }

    fn build_body(&self, request: &ImageRequest) -> Value {
        json!({
            "model": self.model,
            "prompt": request.prompt,
            "n": 1,
            "size": self.vendor_size(request.size),
            "quality": "standard",
            "response_format": "url",
        })
    }

    fn parse_response(body: Value) -> Result<ImageOutput, ProviderError> {
        let response: ImagesResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;

        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no image returned"))?;

        if datum.url.is_none() && datum.b64_json.is_none() {
            return Err(ProviderError::malformed(PROVIDER, "image has neither url nor data"));
        }

        Ok(ImageOutput {
            image_url: datum.url,
            image_data: datum.b64_json,
        })
    }
}

impl ImageProvider for DalleProvider {
    fn generate_image(
        &self,
        request: ImageRequest,
    ) -> BoxFuture<'_, Result<ImageOutput, ProviderError>> {
        Box::pin(async move {
            debug!(
                "DALL-E request with model {} at {}",
                self.model,
                self.vendor_size(request.size)
            );

            let http_request = self
                .client
                .post(format!("{}/v1/images/generations", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&self.build_body(&request));
            let body = send_json(PROVIDER, self.timeout, http_request).await?;
            Self::parse_response(body)
        })
    }

    fn model(&self) -> ImageModel {
        ImageModel::Dalle
    }
}
