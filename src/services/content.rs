use crate::analysis::{ContentAnalyzer, strip_html};
use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ProviderKind, ProviderRegistry, TextRequest, TextSelectionInput, select_text_provider};
use crate::services::{language_name, text_provider, truncate_chars};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const MAX_TOPIC_CHARS: usize = 500;
pub const MAX_KEYWORDS: usize = 10;
pub const MAX_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Product,
    Category,
    Meta,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Blog,
        ContentType::Product,
        ContentType::Category,
        ContentType::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Product => "product",
            ContentType::Category => "category",
            ContentType::Meta => "meta",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value.trim())
            .ok_or_else(|| {
                ServiceError::validation(
                    "Invalid content type. Must be one of: blog, product, category, meta",
                )
            })
    }

    fn default_tone(&self) -> &'static str {
        match self {
            ContentType::Blog | ContentType::Meta => "professional",
            ContentType::Product => "persuasive",
            ContentType::Category => "informative",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ContentLength {
    pub fn guide(&self) -> &'static str {
        match self {
            ContentLength::Short => "500-800 words",
            ContentLength::Medium => "1000-1500 words",
            ContentLength::Long => "2000-3000 words",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub topic: String,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub length: ContentLength,
    /// Provider hint (`gemini`, `gpt4`, `claude`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl ContentRequest {
    pub fn validate(&self) -> ServiceResult<ContentType> {
        if self.topic.trim().is_empty() {
            return Err(ServiceError::validation(
                "Topic is required and cannot be empty",
            ));
        }
        if self.topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(ServiceError::validation(format!(
                "Topic is too long (maximum {} characters)",
                MAX_TOPIC_CHARS
            )));
        }
        if self.keywords.len() > MAX_KEYWORDS {
            return Err(ServiceError::validation(format!(
                "Too many keywords (maximum {})",
                MAX_KEYWORDS
            )));
        }
        ContentType::parse(&self.content_type)
    }

    /// Same request with keywords sorted, so keyword order does not split the cache.
    pub fn cache_identity(&self) -> Self {
        let mut identity = self.clone();
        identity.keywords.sort();
        identity
    }

    fn is_thai(&self) -> bool {
        self.language.trim().eq_ignore_ascii_case("th")
    }

    fn is_long_form(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Blog || self.length == ContentLength::Long
    }

    fn primary_keyword(&self) -> Option<&str> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
    }

    fn summary_limit(&self) -> usize {
        if self.is_thai() { 100 } else { 160 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub word_count: usize,
    pub keyword_density: BTreeMap<String, f64>,
    pub readability_score: f64,
    pub generation_time_ms: u64,
    pub provider: ProviderKind,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub meta_description: String,
    pub content_type: ContentType,
    pub language: String,
    pub seo_score: u32,
    pub suggestions: Vec<String>,
    pub metadata: ContentMetadata,
}

/// Parts pulled out of the raw model output.
#[derive(Debug, Default, PartialEq)]
struct Sections {
    title: String,
    body: String,
    excerpt: String,
    meta_description: String,
}

pub struct ContentService {
    registry: Arc<ProviderRegistry>,
    analyzer: ContentAnalyzer,
}

impl ContentService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            analyzer: ContentAnalyzer::new(),
        }
    }

    pub async fn generate(&self, request: ContentRequest) -> ServiceResult<GeneratedContent> {
        let content_type = request.validate()?;
        let started = Instant::now();

        let selection = select_text_provider(
            TextSelectionInput {
                hint: request.model.as_deref(),
                language: Some(&request.language),
                long_form: request.is_long_form(content_type),
            },
            &self.registry.availability(),
        )?;
        info!(
            "Generating {} content with {} ({:?})",
            content_type, selection.provider, selection.reason
        );

        let provider = text_provider(&self.registry, selection.provider, "content generation")?;
        let response = provider
            .generate(TextRequest::new(build_prompt(&request, content_type)))
            .await?;

        let sections = extract_sections(&response.text, &request, content_type);
        let analysis = self
            .analyzer
            .analyze(&strip_html(&sections.body), &request.keywords);
        debug!(
            "Content analysis: score {} over {} words",
            analysis.seo_score, analysis.word_count
        );

        Ok(GeneratedContent {
            title: sections.title,
            content: sections.body,
            excerpt: sections.excerpt,
            meta_description: sections.meta_description,
            content_type,
            language: request.language.clone(),
            seo_score: analysis.seo_score,
            suggestions: analysis.suggestions,
            metadata: ContentMetadata {
                word_count: analysis.word_count,
                keyword_density: analysis.keyword_density,
                readability_score: analysis.readability_score,
                generation_time_ms: started.elapsed().as_millis() as u64,
                provider: response.provider,
                model: response.model,
            },
        })
    }
}

pub(crate) fn build_prompt(request: &ContentRequest, content_type: ContentType) -> String {
    let keywords = request.keywords.join(", ");
    let language = language_name(&request.language);
    let tone = request
        .tone
        .as_deref()
        .unwrap_or_else(|| content_type.default_tone());

    match content_type {
        ContentType::Blog => format!(
            "Write a comprehensive blog post about \"{topic}\".\n\n\
             Requirements:\n\
             - Target keywords: {keywords}\n\
             - Language: {language}\n\
             - Tone: {tone}\n\
             - Length: {length}\n\
             - Include proper headings (H1, H2, H3)\n\
             - Optimize for SEO\n\
             - Make it engaging and informative\n\
             - Include a compelling introduction and conclusion\n\n\
             Start with a line \"Title: <title>\". Focus on providing valuable, actionable \
             information while naturally incorporating the target keywords.",
            topic = request.topic,
            length = request.length.guide(),
        ),
        ContentType::Product => format!(
            "Create a compelling product description for \"{topic}\".\n\n\
             Requirements:\n\
             - Target keywords: {keywords}\n\
             - Language: {language}\n\
             - Tone: {tone}\n\
             - Highlight key features and benefits\n\
             - Include technical specifications if relevant\n\
             - Address customer pain points\n\
             - Include a clear call-to-action\n\
             - Optimize for search engines\n\
             - Keep it concise but informative (200-400 words)\n\n\
             Make it compelling and conversion-focused while being SEO-friendly.",
            topic = request.topic,
        ),
        ContentType::Category => format!(
            "Write a category description for \"{topic}\".\n\n\
             Requirements:\n\
             - Target keywords: {keywords}\n\
             - Language: {language}\n\
             - Tone: {tone}\n\
             - Explain what the category contains\n\
             - Highlight key benefits and features\n\
             - Help users understand what they'll find\n\
             - Include relevant keywords naturally\n\
             - Keep it concise (150-300 words)\n\
             - Make it helpful for both users and search engines\n\n\
             Focus on clarity and usefulness while optimizing for SEO.",
            topic = request.topic,
        ),
        ContentType::Meta => format!(
            "Create an SEO-optimized meta description for \"{topic}\".\n\n\
             Requirements:\n\
             - Target keywords: {keywords}\n\
             - Language: {language}\n\
             - Length: 150-160 characters\n\
             - Include primary keyword\n\
             - Make it compelling and click-worthy\n\
             - Accurately describe the content\n\
             - Include a call-to-action if appropriate\n\n\
             Reply with the meta description only.",
            topic = request.topic,
        ),
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let prefix = line.get(..label.len())?;
    if prefix.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

fn extract_sections(raw: &str, request: &ContentRequest, content_type: ContentType) -> Sections {
    let limit = request.summary_limit();

    if content_type == ContentType::Meta {
        let text = raw.trim().trim_matches('"').trim();
        let description = strip_label(text, "meta description:").unwrap_or(text);
        return Sections {
            title: truncate_chars(&fallback_title(request), MAX_TITLE_CHARS),
            body: description.to_string(),
            excerpt: truncate_chars(description, limit),
            meta_description: truncate_chars(description, limit),
        };
    }

    let mut sections = Sections::default();
    let mut body = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if sections.title.is_empty()
            && let Some(title) = strip_label(trimmed, "title:").or_else(|| trimmed.strip_prefix("# "))
        {
            sections.title = title.trim().to_string();
        } else if let Some(excerpt) = strip_label(trimmed, "excerpt:") {
            sections.excerpt = excerpt.to_string();
        } else if let Some(meta) = strip_label(trimmed, "meta description:") {
            sections.meta_description = meta.to_string();
        } else {
            body.push(line);
        }
    }

    sections.body = body.join("\n").trim().to_string();

    if sections.title.is_empty() {
        sections.title = fallback_title(request);
    }
    if sections.excerpt.is_empty() {
        sections.excerpt = first_sentence(&strip_html(&sections.body));
    }
    if sections.meta_description.is_empty() {
        sections.meta_description = fallback_meta_description(request);
    }

    sections.title = truncate_chars(&sections.title, MAX_TITLE_CHARS);
    sections.excerpt = truncate_chars(&sections.excerpt, limit);
    sections.meta_description = truncate_chars(&sections.meta_description, limit);
    sections
}

fn fallback_title(request: &ContentRequest) -> String {
    let topic = request.topic.trim();
    match request.primary_keyword() {
        Some(keyword) if !topic.to_lowercase().contains(&keyword.to_lowercase()) => {
            format!("{} - {} Guide", topic, keyword)
        }
        _ => topic.to_string(),
    }
}

fn fallback_meta_description(request: &ContentRequest) -> String {
    let topic = request.topic.trim();
    let keyword = request.primary_keyword();
    if request.is_thai() {
        match keyword {
            Some(k) => format!("เรียนรู้เกี่ยวกับ {} และ {} ในคู่มือฉบับสมบูรณ์นี้", topic, k),
            None => format!("เรียนรู้เกี่ยวกับ {} ในคู่มือฉบับสมบูรณ์นี้", topic),
        }
    } else {
        match keyword {
            Some(k) => format!("Learn about {} and {} in this comprehensive guide.", topic, k),
            None => format!("Learn about {} in this comprehensive guide.", topic),
        }
    }
}

fn first_sentence(text: &str) -> String {
    text.split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}
