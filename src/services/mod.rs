//! Capability services invoked by the orchestrator's tools.
//!
//! Each service validates its typed request before touching the network,
//! picks a provider through [`crate::llm::selection`] and returns a
//! serializable result. None of them caches or rate-limits; the
//! [`ServiceManager`](crate::ServiceManager) does that around them.

pub mod content;
pub mod image;
pub mod keywords;
pub mod seo;
pub mod translation;
pub mod wordpress;

pub use content::{ContentLength, ContentRequest, ContentService, ContentType, GeneratedContent};
pub use image::{GeneratedImage, ImageGenerationRequest, ImageService};
pub use keywords::{CompetitionLevel, KeywordResearch, KeywordResearchRequest, KeywordService};
pub use seo::{HttpPageFetcher, OnPageReport, PageFetcher, SeoAnalysis, SeoRequest, SeoService};
pub use translation::{TranslationRequest, TranslationResult, TranslationService};
pub use wordpress::{
    HttpWordPressApi, WordPressAction, WordPressApi, WordPressContentType, WordPressRequest,
    WordPressResult, WordPressService,
};

use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ProviderKind, ProviderRegistry, TextProvider};
use std::sync::Arc;

/// Shortens `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

pub(crate) fn text_provider(
    registry: &ProviderRegistry,
    kind: ProviderKind,
    capability: &str,
) -> ServiceResult<Arc<dyn TextProvider>> {
    registry
        .text(kind)
        .ok_or_else(|| ServiceError::no_provider(capability))
}

pub(crate) fn language_name(code: &str) -> String {
    match code.trim().to_lowercase().as_str() {
        "" | "en" => "English".to_string(),
        "th" => "Thai".to_string(),
        _ => code.trim().to_string(),
    }
}
