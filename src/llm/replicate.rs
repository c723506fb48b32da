use crate::llm::http::{build_client, send_json, trim_base_url};
use crate::llm::polling::{PollObservation, PollPolicy, poll_until_terminal};
use crate::llm::provider::ImageProvider;
use crate::llm::types::{ImageModel, ImageOutput, ImageRequest, ProviderError, ProviderKind};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: ProviderKind = ProviderKind::Replicate;

/// Replicate prediction adapter. Submits a job, then polls it to completion.
pub struct ReplicateProvider {
    variant: ImageModel,
    client: Client,
    base_url: String,
    api_token: String,
    model_name: String,
    timeout: Duration,
    poll: PollPolicy,
}

#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Prediction {
    fn observation(self) -> PollObservation<Value> {
        match self.status.as_str() {
            "succeeded" => PollObservation::Succeeded(self.output.unwrap_or(Value::Null)),
            "failed" | "canceled" => {
                let message = match self.error {
                    Some(Value::String(message)) => message,
                    Some(Value::Null) | None => format!("prediction {}", self.status),
                    Some(other) => other.to_string(),
                };
                PollObservation::Failed(message)
            }
            _ => PollObservation::Pending,
        }
    }
}

impl ReplicateProvider {
    pub fn new(
        variant: ImageModel,
        api_token: String,
        base_url: &str,
        model_name: &str,
        timeout: Duration,
        poll: PollPolicy,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            variant,
            client: build_client(PROVIDER, timeout)?,
            base_url: trim_base_url(base_url),
            api_token,
            model_name: model_name.trim_matches('/').to_string(),
            timeout,
            poll,
        })
    }

    fn build_input(&self, request: &ImageRequest) -> Value {
        match self.variant {
            ImageModel::Flux => json!({
                "prompt": request.prompt,
                "num_outputs": 1,
                "aspect_ratio": request.size.aspect_ratio(),
                "output_format": "webp",
                "output_quality": 90,
                "num_inference_steps": request.steps.unwrap_or(4),
                "guidance": request.guidance_scale.unwrap_or(3.5),
            }),
            _ => {
                let (width, height) = request.size.dimensions();
                let mut input = json!({
                    "prompt": request.prompt,
                    "width": width,
                    "height": height,
                    "num_outputs": 1,
                    "num_inference_steps": request.steps.unwrap_or(50),
                    "guidance_scale": request.guidance_scale.unwrap_or(7.0),
                });
                if let Some(negative) = &request.negative_prompt {
                    input["negative_prompt"] = json!(negative);
                }
                input
            }
        }
    }

    /// First image URL from a prediction output (a string or a list of strings).
    fn extract_output(output: &Value) -> Option<String> {
        match output {
            Value::String(url) => Some(url.clone()),
            Value::Array(items) => items.iter().find_map(|item| item.as_str().map(String::from)),
            _ => None,
        }
    }

    async fn submit(&self, request: &ImageRequest) -> Result<Prediction, ProviderError> {
        let http_request = self
            .client
            .post(format!(
                "{}/v1/models/{}/predictions",
                self.base_url, self.model_name
            ))
            .bearer_auth(&self.api_token)
            .json(&json!({"input": self.build_input(request)}));
        let body = send_json(PROVIDER, self.timeout, http_request).await?;
        serde_json::from_value(body).map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))
    }

    async fn fetch(&self, prediction_id: &str) -> Result<Prediction, ProviderError> {
        let http_request = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, prediction_id))
            .bearer_auth(&self.api_token);
        let body = send_json(PROVIDER, self.timeout, http_request).await?;
        serde_json::from_value(body).map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))
    }
}

impl ImageProvider for ReplicateProvider {
    fn generate_image(
        &self,
        request: ImageRequest,
    ) -> BoxFuture<'_, Result<ImageOutput, ProviderError>> {
        Box::pin(async move {
            let submitted = self.submit(&request).await?;
            let prediction_id = submitted.id.clone();
            info!(
                "Submitted {} prediction {} to {}",
                self.variant, prediction_id, self.model_name
            );

            let output = match submitted.observation() {
                // Predictions created with a sync preference can finish immediately
                PollObservation::Succeeded(output) => output,
                PollObservation::Failed(message) => {
                    return Err(ProviderError::generation_failed(PROVIDER, message));
                }
                PollObservation::Pending => {
                    let state = poll_until_terminal(self.poll, |attempt| {
                        debug!("Polling prediction {} (attempt {})", prediction_id, attempt);
                        let id = prediction_id.clone();
                        async move { self.fetch(&id).await.map(Prediction::observation) }
                    })
                    .await?;
                    state.into_result(|message| ProviderError::generation_failed(PROVIDER, message))?
                }
            };

            let url = Self::extract_output(&output).ok_or_else(|| {
                ProviderError::malformed(PROVIDER, "prediction succeeded without an image URL")
            })?;

            Ok(ImageOutput {
                image_url: Some(url),
                image_data: None,
            })
        })
    }

    fn model(&self) -> ImageModel {
        self.variant
    }
}
