use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ImageModel, ImageRequest, ImageSize, ProviderRegistry, select_image_model};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const MAX_PROMPT_CHARS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
}

impl ImageGenerationRequest {
    pub fn validate(&self) -> ServiceResult<ImageSize> {
        if self.prompt.trim().is_empty() {
            return Err(ServiceError::validation(
                "Prompt is required and cannot be empty",
            ));
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ServiceError::validation(format!(
                "Prompt must be {} characters or less",
                MAX_PROMPT_CHARS
            )));
        }
        if let Some(steps) = self.steps
            && !(1..=100).contains(&steps)
        {
            return Err(ServiceError::validation("steps must be between 1 and 100"));
        }
        parse_size(self.size.as_deref())
    }
}

fn parse_size(size: Option<&str>) -> ServiceResult<ImageSize> {
    match size.map(str::trim) {
        None | Some("") => Ok(ImageSize::default()),
        Some("512x512") => Ok(ImageSize::Square512),
        Some("1024x1024") => Ok(ImageSize::Square1024),
        Some("1024x768") => Ok(ImageSize::Landscape1024x768),
        Some(other) => Err(ServiceError::validation(format!(
            "Invalid size '{}'. Must be one of: {}",
            other,
            ImageSize::SUPPORTED.join(", ")
        ))),
    }
}

/// Appends the style's descriptors to the user's prompt.
pub fn enhance_prompt(prompt: &str, style: Option<&str>) -> String {
    let suffix = match style.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("realistic") => ", photorealistic, high quality, detailed, professional photography",
        Some("artistic") => ", artistic, creative, beautiful composition, masterpiece",
        Some("minimalist") => ", minimalist, clean, simple, elegant design",
        Some("vintage") => ", vintage style, retro, classic, nostalgic",
        Some("modern") => ", modern, contemporary, sleek, professional",
        _ => ", high quality, detailed, professional",
    };
    format!("{}{}", prompt.trim(), suffix)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    pub model: ImageModel,
    pub enhanced_prompt: String,
    pub size: ImageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub generation_time_ms: u64,
}

pub struct ImageService {
    registry: Arc<ProviderRegistry>,
}

impl ImageService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub async fn generate(&self, request: ImageGenerationRequest) -> ServiceResult<GeneratedImage> {
        let size = request.validate()?;
        let started = Instant::now();

        let selection = select_image_model(
            request.model.as_deref(),
            request.style.as_deref(),
            &self.registry.availability(),
        )?;
        let provider = self
            .registry
            .image(selection.model)
            .ok_or_else(|| ServiceError::no_provider("image generation"))?;

        let enhanced_prompt = enhance_prompt(&request.prompt, request.style.as_deref());
        info!(
            "Generating {} image with {} ({:?})",
            size.as_str(),
            selection.model,
            selection.reason
        );

        let output = provider
            .generate_image(ImageRequest {
                prompt: enhanced_prompt.clone(),
                size,
                steps: request.steps,
                guidance_scale: request.guidance_scale,
                negative_prompt: request.negative_prompt.clone(),
            })
            .await?;

        if output.image_url.is_none() && output.image_data.is_none() {
            return Err(ServiceError::Provider(format!(
                "{} returned no image",
                selection.model
            )));
        }

        Ok(GeneratedImage {
            image_url: output.image_url,
            image_data: output.image_data,
            model: selection.model,
            enhanced_prompt,
            size,
            style: request.style,
            generation_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::llm::ProviderError;
    use crate::llm::testing::ScriptedImage;

    fn request(prompt: &str) -> ImageGenerationRequest {
        ImageGenerationRequest {
            prompt: prompt.to_string(),
            style: None,
            size: None,
            model: None,
            negative_prompt: None,
            steps: None,
            guidance_scale: None,
        }
    }

    #[test]
    fn test_enhance_prompt_styles() {
        assert_eq!(
            enhance_prompt("a cat", Some("vintage")),
            "a cat, vintage style, retro, classic, nostalgic"
        );
        assert_eq!(
            enhance_prompt(" a cat ", None),
            "a cat, high quality, detailed, professional"
        );
        assert!(enhance_prompt("a cat", Some("Realistic")).contains("photorealistic"));
        assert!(enhance_prompt("a cat", Some("surreal")).ends_with("detailed, professional"));
    }

    #[test]
    fn test_validation() {
        assert_eq!(request("cat").validate().unwrap(), ImageSize::Square1024);

        let mut sized = request("cat");
        sized.size = Some("1024x768".to_string());
        assert_eq!(sized.validate().unwrap(), ImageSize::Landscape1024x768);

        sized.size = Some("800x600".to_string());
        let err = sized.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid size '800x600'"));

        assert!(request("  ").validate().is_err());
    }

    #[tokio::test]
    async fn test_generate_routes_artistic_to_midjourney() {
        let flux = Arc::new(ScriptedImage::replying(ImageModel::Flux, "https://img/flux.webp"));
        let midjourney = Arc::new(ScriptedImage::replying(
            ImageModel::Midjourney,
            "https://img/mj.png",
        ));
        let registry = ProviderRegistry::new()
            .with_image_provider(flux.clone())
            .with_image_provider(midjourney.clone());
        let service = ImageService::new(Arc::new(registry));

        let mut artistic = request("a lighthouse");
        artistic.style = Some("artistic".to_string());
        let image = service.generate(artistic).await.unwrap();

        assert_eq!(image.model, ImageModel::Midjourney);
        assert_eq!(image.image_url.as_deref(), Some("https://img/mj.png"));
        assert_eq!(flux.calls(), 0);
        let sent = midjourney.last_request().unwrap();
        assert!(sent.prompt.ends_with("masterpiece"));
    }

    #[tokio::test]
    async fn test_invalid_size_never_reaches_provider() {
        let flux = Arc::new(ScriptedImage::replying(ImageModel::Flux, "https://img/x"));
        let service = ImageService::new(Arc::new(
            ProviderRegistry::new().with_image_provider(flux.clone()),
        ));

        let mut bad = request("cat");
        bad.size = Some("2048x2048".to_string());
        let err = service.generate(bad).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(flux.calls(), 0);
    }

    #[tokio::test]
    async fn test_poll_timeout_surfaces_as_timeout() {
        let flux = Arc::new(ScriptedImage::failing(
            ImageModel::Flux,
            ProviderError::PollTimeout { attempts: 30 },
        ));
        let service = ImageService::new(Arc::new(
            ProviderRegistry::new().with_image_provider(flux),
        ));

        let err = service.generate(request("cat")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Timeout);
    }
}
