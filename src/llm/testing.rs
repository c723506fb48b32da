//! Scripted adapters for unit tests.

use crate::llm::provider::{ImageProvider, TextProvider};
use crate::llm::types::{
    ImageModel, ImageOutput, ImageRequest, ProviderError, ProviderKind, TextRequest, TextResponse,
};
use futures::future::BoxFuture;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every request with the same text and records the prompts it saw.
pub struct ScriptedText {
    kind: ProviderKind,
    reply: Result<String, ProviderError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<TextRequest>>,
}

impl ScriptedText {
    pub fn replying(kind: ProviderKind, reply: impl Into<String>) -> Self {
        Self {
            kind,
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: ProviderKind, error: ProviderError) -> Self {
        Self {
            kind,
            reply: Err(error),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TextRequest> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

impl TextProvider for ScriptedText {
    fn generate(&self, request: TextRequest) -> BoxFuture<'_, Result<TextResponse, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let request_id = request.id;
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(request);
            }
            let text = self.reply.clone()?;
            Ok(TextResponse {
                request_id,
                text,
                provider: self.kind,
                model: format!("{}-test", self.kind),
                execution_time: Duration::from_millis(1),
            })
        })
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn default_model(&self) -> &str {
        "test"
    }
}

pub struct ScriptedImage {
    model: ImageModel,
    reply: Result<ImageOutput, ProviderError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
}

impl ScriptedImage {
    pub fn replying(model: ImageModel, url: &str) -> Self {
        Self {
            model,
            reply: Ok(ImageOutput {
                image_url: Some(url.to_string()),
                image_data: None,
            }),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(model: ImageModel, error: ProviderError) -> Self {
        Self {
            model,
            reply: Err(error),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ImageRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl ImageProvider for ScriptedImage {
    fn generate_image(
        &self,
        request: ImageRequest,
    ) -> BoxFuture<'_, Result<ImageOutput, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            self.reply.clone()
        })
    }

    fn model(&self) -> ImageModel {
        self.model
    }
}
