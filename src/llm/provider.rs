use crate::config::{Credentials, ServiceConfig};
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::dalle::DalleProvider;
use crate::llm::gemini::GeminiProvider;
use crate::llm::openai::OpenAIProvider;
use crate::llm::replicate::ReplicateProvider;
use crate::llm::selection::ProviderAvailability;
use crate::llm::types::{
    ImageModel, ImageOutput, ImageRequest, ProviderError, ProviderKind, TextRequest, TextResponse,
};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Text generation adapter wrapping one vendor API.
pub trait TextProvider: Send + Sync {
    /// Execute a single text generation request
    fn generate(&self, request: TextRequest) -> BoxFuture<'_, Result<TextResponse, ProviderError>>;

    /// Vendor behind this adapter
    fn kind(&self) -> ProviderKind;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;

    /// Clean up resources
    fn shutdown(&self) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Image generation adapter for one model.
pub trait ImageProvider: Send + Sync {
    fn generate_image(
        &self,
        request: ImageRequest,
    ) -> BoxFuture<'_, Result<ImageOutput, ProviderError>>;

    fn model(&self) -> ImageModel;

    fn shutdown(&self) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Adapters available to one orchestrator instance, keyed by vendor/model.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    text: BTreeMap<ProviderKind, Arc<dyn TextProvider>>,
    image: BTreeMap<ImageModel, Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one adapter per configured credential.
    pub fn from_credentials(
        credentials: &Credentials,
        config: &ServiceConfig,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();

        if let Some(key) = &credentials.google_api_key {
            registry = registry.with_text_provider(Arc::new(GeminiProvider::new(
                key.clone(),
                &config.endpoints.gemini,
                &config.models.gemini,
                config.http.text_timeout(),
            )?));
        }

        if let Some(key) = &credentials.openai_api_key {
            registry = registry
                .with_text_provider(Arc::new(OpenAIProvider::new(
                    key.clone(),
                    &config.endpoints.openai,
                    &config.models.openai_chat,
                    config.http.text_timeout(),
                )?))
                .with_image_provider(Arc::new(DalleProvider::new(
                    key.clone(),
                    &config.endpoints.openai,
                    &config.models.dalle,
                    config.http.image_timeout(),
                )?));
        }

        if let Some(key) = &credentials.anthropic_api_key {
            registry = registry.with_text_provider(Arc::new(AnthropicProvider::new(
                key.clone(),
                &config.endpoints.anthropic,
                &config.models.anthropic,
                config.http.text_timeout(),
            )?));
        }

        if let Some(token) = &credentials.replicate_api_token {
            for model in [ImageModel::Flux, ImageModel::Midjourney] {
                let model_name = match model {
                    ImageModel::Flux => &config.models.flux,
                    _ => &config.models.openjourney,
                };
                registry = registry.with_image_provider(Arc::new(ReplicateProvider::new(
                    model,
                    token.clone(),
                    &config.endpoints.replicate,
                    model_name,
                    config.http.image_timeout(),
                    config.polling.policy(),
                )?));
            }
        }

        info!(
            "Provider registry ready: text={:?}, image={:?}",
            registry.text.keys().collect::<Vec<_>>(),
            registry.image.keys().collect::<Vec<_>>()
        );

        Ok(registry)
    }

    pub fn with_text_provider(mut self, provider: Arc<dyn TextProvider>) -> Self {
        self.text.insert(provider.kind(), provider);
        self
    }

    pub fn with_image_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.image.insert(provider.model(), provider);
        self
    }

    pub fn text(&self, kind: ProviderKind) -> Option<Arc<dyn TextProvider>> {
        self.text.get(&kind).cloned()
    }

    pub fn image(&self, model: ImageModel) -> Option<Arc<dyn ImageProvider>> {
        self.image.get(&model).cloned()
    }

    /// Presence snapshot consumed by the selection policy.
    pub fn availability(&self) -> ProviderAvailability {
        let mut availability = ProviderAvailability::new();
        for kind in self.text.keys() {
            availability = availability.with_text(*kind);
        }
        for model in self.image.keys() {
            availability = availability.with_image(*model);
        }
        availability
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_empty()
    }

    pub async fn shutdown(&self) -> Result<(), ProviderError> {
        for provider in self.text.values() {
            provider.shutdown().await?;
        }
        for provider in self.image.values() {
            provider.shutdown().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("text", &self.text.keys().collect::<Vec<_>>())
            .field("image", &self.image.keys().collect::<Vec<_>>())
            .finish()
    }
}
