//! English/Thai translation with cultural adaptation.
//!
//! English to Thai requests get glossary hints injected into the source text,
//! a culturally aware prompt and punctuation clean-up of the output. Thai to
//! English and any other pair go straight through a plain prompt.

use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ProviderKind, ProviderRegistry, TextRequest, select_translation_provider};
use crate::services::{language_name, text_provider};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::info;

pub const MAX_TEXT_CHARS: usize = 10_000;

/// Domain terms kept in English with their Thai rendering appended.
pub const THAI_GLOSSARY: [(&str, &str); 15] = [
    ("bong", "บ้อง"),
    ("water pipe", "ไปป์น้ำ"),
    ("rolling papers", "กระดาษม้วน"),
    ("grinder", "เครื่องบด"),
    ("vaporizer", "เครื่องระเหย"),
    ("hemp", "กัญชง"),
    ("cannabis", "กัญชา"),
    ("CBD", "ซีบีดี"),
    ("THC", "ทีเอชซี"),
    ("accessories", "อุปกรณ์เสริม"),
    ("glass", "แก้ว"),
    ("quality", "คุณภาพ"),
    ("premium", "พรีเมียม"),
    ("wholesale", "ขายส่ง"),
    ("retail", "ขายปลีก"),
];

static GLOSSARY_PATTERNS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    THAI_GLOSSARY
        .iter()
        .filter_map(|(english, thai)| {
            RegexBuilder::new(&format!(r"\b{}\b", regex::escape(english)))
                .case_insensitive(true)
                .build()
                .ok()
                .map(|re| (re, format!("{} ({})", english, thai)))
        })
        .collect()
});

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());
static COMMA: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*,\s*").ok());
static PERIOD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*\.\s*").ok());
static EXCLAMATION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*!\s*").ok());
static QUESTION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*\?\s*").ok());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default = "default_source")]
    pub source_language: String,
    #[serde(default = "default_target")]
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default = "default_cultural_adaptation")]
    pub cultural_adaptation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_source() -> String {
    "en".to_string()
}

fn default_target() -> String {
    "th".to_string()
}

fn default_cultural_adaptation() -> bool {
    true
}

impl TranslationRequest {
    pub fn validate(&self) -> ServiceResult<Direction> {
        if self.text.trim().is_empty() {
            return Err(ServiceError::validation(
                "Text is required and cannot be empty",
            ));
        }
        if self.text.chars().count() > MAX_TEXT_CHARS {
            return Err(ServiceError::validation(format!(
                "Text must be {} characters or less",
                MAX_TEXT_CHARS
            )));
        }
        Ok(Direction::of(&self.source_language, &self.target_language))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    EnglishToThai,
    ThaiToEnglish,
    Other,
}

impl Direction {
    fn of(source: &str, target: &str) -> Self {
        match (
            source.trim().to_lowercase().as_str(),
            target.trim().to_lowercase().as_str(),
        ) {
            ("en", "th") => Direction::EnglishToThai,
            ("th", "en") => Direction::ThaiToEnglish,
            _ => Direction::Other,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Direction::EnglishToThai => 0.9,
            Direction::ThaiToEnglish => 0.85,
            Direction::Other => 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub cultural_notes: Vec<String>,
    pub confidence_score: f64,
    pub alternatives: Vec<String>,
    pub provider: ProviderKind,
}

pub struct TranslationService {
    registry: Arc<ProviderRegistry>,
}

impl TranslationService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub async fn translate(&self, request: TranslationRequest) -> ServiceResult<TranslationResult> {
        let direction = request.validate()?;

        let selection =
            select_translation_provider(request.model.as_deref(), &self.registry.availability())?;
        let provider = text_provider(&self.registry, selection.provider, "translation")?;
        info!(
            "Translating {} -> {} with {}",
            request.source_language, request.target_language, selection.provider
        );

        let prompt = match direction {
            Direction::EnglishToThai => thai_prompt(&request),
            Direction::ThaiToEnglish => english_prompt(&request),
            Direction::Other => general_prompt(&request),
        };
        let response = provider
            .generate(TextRequest::new(prompt).with_max_tokens(1000))
            .await?;

        let (translated_text, cultural_notes) = match direction {
            Direction::EnglishToThai => {
                let notes = if request.cultural_adaptation {
                    cultural_notes(&request.text)
                } else {
                    Vec::new()
                };
                (postprocess_thai(&response.text), notes)
            }
            _ => (response.text.trim().to_string(), Vec::new()),
        };

        Ok(TranslationResult {
            translated_text,
            source_language: request.source_language,
            target_language: request.target_language,
            cultural_notes,
            confidence_score: direction.confidence(),
            alternatives: Vec::new(),
            provider: response.provider,
        })
    }
}

/// Appends the Thai rendering after each glossary term, e.g. `bong (บ้อง)`.
pub fn annotate_glossary(text: &str) -> String {
    GLOSSARY_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern
                .replace_all(&acc, regex::NoExpand(replacement))
                .into_owned()
        })
}

fn thai_prompt(request: &TranslationRequest) -> String {
    let text = annotate_glossary(&request.text);
    let context = request
        .context
        .as_deref()
        .unwrap_or("Cannabis business content for Thai market");

    let mut prompt = format!(
        "Translate the following English text to Thai, following these guidelines:\n\n\
         1. Use natural, fluent Thai language\n\
         2. Maintain professional business tone\n\
         3. Use appropriate politeness particles (ครับ/ค่ะ)\n\
         4. Adapt for Thai cultural context\n\
         5. Ensure cannabis terminology is appropriate for Thai market\n\n\
         English text: {text}\n\n\
         Context: {context}"
    );

    if request.cultural_adaptation {
        prompt.push_str(
            "\n\nAdditional cultural adaptation requirements:\n\
             - Adapt content for Thai cultural values and preferences\n\
             - Use respectful language appropriate for Thai business culture\n\
             - Consider local market conditions and regulations\n\
             - Ensure content is culturally sensitive and appropriate",
        );
    }

    prompt.push_str(
        "\n\nProvide only the Thai translation, ensuring it sounds natural to native Thai speakers.",
    );
    prompt
}

fn english_prompt(request: &TranslationRequest) -> String {
    format!(
        "Translate the following Thai text to English, maintaining the meaning and context:\n\n\
         Thai text: {}\n\n\
         Context: {}\n\n\
         Provide a natural, accurate English translation that preserves the original meaning.",
        request.text,
        request.context.as_deref().unwrap_or("General business content")
    )
}

fn general_prompt(request: &TranslationRequest) -> String {
    format!(
        "Translate from {} to {}:\n\n\
         Text: {}\n\
         Context: {}\n\n\
         Provide an accurate translation that maintains the original meaning.",
        language_name(&request.source_language),
        language_name(&request.target_language),
        request.text,
        request.context.as_deref().unwrap_or("General content")
    )
}

/// Thai does not end sentences with a full stop; commas, `!` and `?` are
/// followed by a single space.
pub fn postprocess_thai(text: &str) -> String {
    let text = replace(&WHITESPACE, text.trim().to_string(), " ");
    let text = replace(&COMMA, text, ", ");
    let text = replace(&PERIOD, text, " ");
    let text = replace(&EXCLAMATION, text, "! ");
    let text = replace(&QUESTION, text, "? ");
    text.trim().to_string()
}

fn replace(pattern: &Option<Regex>, input: String, with: &str) -> String {
    match pattern {
        Some(re) => re.replace_all(&input, with).into_owned(),
        None => input,
    }
}

pub fn cultural_notes(original: &str) -> Vec<String> {
    let lowered = original.to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|t| lowered.contains(t));

    let mut notes = Vec::new();
    if mentions(&["cannabis", "hemp"]) {
        notes.push("Cannabis terminology adapted for Thai legal and cultural context".to_string());
    }
    if mentions(&["wholesale", "business"]) {
        notes.push("Business language adapted for Thai commercial culture".to_string());
    }
    if mentions(&["quality", "premium"]) {
        notes.push("Quality descriptors adapted for Thai market preferences".to_string());
    }
    notes
}
