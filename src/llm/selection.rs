//! Deterministic model selection.
//!
//! Every rule is a pure function of the request attributes and the set of
//! configured providers, so the same inputs always pick the same adapter.

use crate::llm::types::{ImageModel, ProviderError, ProviderKind};
use serde::Serialize;
use std::collections::BTreeSet;

/// Text vendors tried in order when no other rule applies.
pub const TEXT_FALLBACK_ORDER: [ProviderKind; 3] = [
    ProviderKind::Gemini,
    ProviderKind::OpenAI,
    ProviderKind::Anthropic,
];

/// Which adapters have a credential behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderAvailability {
    text: BTreeSet<ProviderKind>,
    image: BTreeSet<ImageModel>,
}

impl ProviderAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, kind: ProviderKind) -> Self {
        self.text.insert(kind);
        self
    }

    pub fn with_image(mut self, model: ImageModel) -> Self {
        self.image.insert(model);
        self
    }

    pub fn has_text(&self, kind: ProviderKind) -> bool {
        self.text.contains(&kind)
    }

    pub fn has_image(&self, model: ImageModel) -> bool {
        self.image.contains(&model)
    }

    pub fn has_any_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn has_any_image(&self) -> bool {
        !self.image.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    ExplicitHint,
    ThaiLanguage,
    LongForm,
    StyleMatch,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub provider: ProviderKind,
    pub reason: SelectionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSelection {
    pub model: ImageModel,
    pub reason: SelectionReason,
}

/// Request attributes that influence text provider choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSelectionInput<'a> {
    pub hint: Option<&'a str>,
    pub language: Option<&'a str>,
    pub long_form: bool,
}

pub fn select_text_provider(
    input: TextSelectionInput<'_>,
    availability: &ProviderAvailability,
) -> Result<TextSelection, ProviderError> {
    let pick = |provider, reason| Ok(TextSelection { provider, reason });

    if let Some(kind) = input.hint.and_then(ProviderKind::from_hint)
        && availability.has_text(kind)
    {
        return pick(kind, SelectionReason::ExplicitHint);
    }

    let thai = input
        .language
        .is_some_and(|language| language.trim().eq_ignore_ascii_case("th"));
    if thai && availability.has_text(ProviderKind::Gemini) {
        return pick(ProviderKind::Gemini, SelectionReason::ThaiLanguage);
    }

    if input.long_form && availability.has_text(ProviderKind::Anthropic) {
        return pick(ProviderKind::Anthropic, SelectionReason::LongForm);
    }

    first_available(availability)
        .map(|provider| TextSelection {
            provider,
            reason: SelectionReason::Fallback,
        })
        .ok_or_else(|| ProviderError::NoProviderAvailable {
            capability: "text generation".to_string(),
        })
}

pub fn select_translation_provider(
    hint: Option<&str>,
    availability: &ProviderAvailability,
) -> Result<TextSelection, ProviderError> {
    if let Some(kind) = hint.and_then(ProviderKind::from_hint)
        && availability.has_text(kind)
    {
        return Ok(TextSelection {
            provider: kind,
            reason: SelectionReason::ExplicitHint,
        });
    }

    first_available(availability)
        .map(|provider| TextSelection {
            provider,
            reason: SelectionReason::Fallback,
        })
        .ok_or_else(|| ProviderError::NoProviderAvailable {
            capability: "translation".to_string(),
        })
}

fn first_available(availability: &ProviderAvailability) -> Option<ProviderKind> {
    TEXT_FALLBACK_ORDER
        .into_iter()
        .find(|kind| availability.has_text(*kind))
}

/// Picks the image model for a request.
///
/// Realistic or unstyled prompts go to Flux, artistic and creative ones to the
/// Midjourney-style model. Other styles prefer DALL-E and fall back to
/// whichever Replicate model is configured.
pub fn select_image_model(
    hint: Option<&str>,
    style: Option<&str>,
    availability: &ProviderAvailability,
) -> Result<ImageSelection, ProviderError> {
    let pick = |model, reason| Ok(ImageSelection { model, reason });

    if let Some(model) = hint.and_then(ImageModel::from_hint)
        && availability.has_image(model)
    {
        return pick(model, SelectionReason::ExplicitHint);
    }

    let style = style
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    match style.as_deref() {
        None | Some("realistic") if availability.has_image(ImageModel::Flux) => {
            return pick(ImageModel::Flux, SelectionReason::StyleMatch);
        }
        Some("artistic" | "creative") if availability.has_image(ImageModel::Midjourney) => {
            return pick(ImageModel::Midjourney, SelectionReason::StyleMatch);
        }
        _ => {}
    }

    [ImageModel::Dalle, ImageModel::Flux, ImageModel::Midjourney]
        .into_iter()
        .find(|model| availability.has_image(*model))
        .map(|model| ImageSelection {
            model,
            reason: SelectionReason::Fallback,
        })
        .ok_or_else(|| ProviderError::NoProviderAvailable {
            capability: "image generation".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_only(kinds: &[ProviderKind]) -> ProviderAvailability {
        kinds
            .iter()
            .fold(ProviderAvailability::new(), |a, k| a.with_text(*k))
    }

    fn all_text() -> ProviderAvailability {
        text_only(&TEXT_FALLBACK_ORDER)
    }

    #[test]
    fn test_explicit_hint_wins_when_configured() {
        let input = TextSelectionInput {
            hint: Some("gpt4"),
            language: Some("th"),
            long_form: true,
        };
        let selection = select_text_provider(input, &all_text()).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
        assert_eq!(selection.reason, SelectionReason::ExplicitHint);
    }

    #[test]
    fn test_unconfigured_hint_falls_through() {
        let input = TextSelectionInput {
            hint: Some("claude"),
            ..Default::default()
        };
        let availability = text_only(&[ProviderKind::OpenAI]);
        let selection = select_text_provider(input, &availability).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
        assert_eq!(selection.reason, SelectionReason::Fallback);
    }

    #[test]
    fn test_thai_prefers_gemini() {
        let input = TextSelectionInput {
            language: Some("th"),
            long_form: true,
            ..Default::default()
        };
        assert_eq!(
            select_text_provider(input, &all_text()).unwrap().provider,
            ProviderKind::Gemini
        );
    }

    #[test]
    fn test_long_form_prefers_anthropic() {
        let input = TextSelectionInput {
            language: Some("en"),
            long_form: true,
            ..Default::default()
        };
        assert_eq!(
            select_text_provider(input, &all_text()).unwrap().provider,
            ProviderKind::Anthropic
        );
    }

    #[test]
    fn test_fallback_order() {
        let availability = text_only(&[ProviderKind::Anthropic, ProviderKind::OpenAI]);
        let selection = select_text_provider(TextSelectionInput::default(), &availability).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
    }

    #[test]
    fn test_no_text_provider_is_configuration_error() {
        let err = select_text_provider(TextSelectionInput::default(), &ProviderAvailability::new())
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoProviderAvailable { .. }));
    }

    #[test]
    fn test_thai_selection_is_deterministic() {
        let availability = text_only(&[ProviderKind::Gemini, ProviderKind::Anthropic]);
        let input = TextSelectionInput {
            language: Some("th"),
            long_form: true,
            ..Default::default()
        };
        for _ in 0..100 {
            let selection = select_text_provider(input, &availability).unwrap();
            assert_eq!(selection.provider, ProviderKind::Gemini);
            assert_eq!(selection.reason, SelectionReason::ThaiLanguage);
        }
    }

    #[test]
    fn test_fallback_selection_is_deterministic() {
        let availability = text_only(&[ProviderKind::OpenAI, ProviderKind::Anthropic]);
        let input = TextSelectionInput {
            language: Some("th"),
            ..Default::default()
        };
        let first = select_text_provider(input, &availability).unwrap();
        for _ in 0..100 {
            assert_eq!(select_text_provider(input, &availability).unwrap(), first);
        }
    }

    #[test]
    fn test_translation_order() {
        let availability = text_only(&[ProviderKind::Anthropic, ProviderKind::Gemini]);
        assert_eq!(
            select_translation_provider(None, &availability).unwrap().provider,
            ProviderKind::Gemini
        );
        assert_eq!(
            select_translation_provider(Some("claude"), &availability)
                .unwrap()
                .provider,
            ProviderKind::Anthropic
        );
        assert!(select_translation_provider(None, &ProviderAvailability::new()).is_err());
    }

    #[test]
    fn test_image_style_routing_with_replicate() {
        let availability = ProviderAvailability::new()
            .with_image(ImageModel::Flux)
            .with_image(ImageModel::Midjourney)
            .with_image(ImageModel::Dalle);

        let realistic = select_image_model(None, Some("realistic"), &availability).unwrap();
        assert_eq!(realistic.model, ImageModel::Flux);

        let unstyled = select_image_model(None, None, &availability).unwrap();
        assert_eq!(unstyled.model, ImageModel::Flux);

        let artistic = select_image_model(None, Some("Artistic"), &availability).unwrap();
        assert_eq!(artistic.model, ImageModel::Midjourney);

        let minimalist = select_image_model(None, Some("minimalist"), &availability).unwrap();
        assert_eq!(minimalist.model, ImageModel::Dalle);

        let hinted = select_image_model(Some("dalle"), Some("realistic"), &availability).unwrap();
        assert_eq!(hinted.model, ImageModel::Dalle);
        assert_eq!(hinted.reason, SelectionReason::ExplicitHint);
    }

    #[test]
    fn test_image_falls_back_to_dalle_then_replicate() {
        let dalle_only = ProviderAvailability::new().with_image(ImageModel::Dalle);
        assert_eq!(
            select_image_model(Some("flux"), Some("realistic"), &dalle_only)
                .unwrap()
                .model,
            ImageModel::Dalle
        );

        let replicate_only = ProviderAvailability::new()
            .with_image(ImageModel::Flux)
            .with_image(ImageModel::Midjourney);
        assert_eq!(
            select_image_model(None, Some("vintage"), &replicate_only)
                .unwrap()
                .model,
            ImageModel::Flux
        );

        assert!(select_image_model(None, None, &ProviderAvailability::new()).is_err());
    }
}
