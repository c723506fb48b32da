use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ProviderKind, ProviderRegistry, TextRequest, TextSelectionInput, select_text_provider};
use crate::services::{language_name, text_provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

pub const MAX_SEED_KEYWORDS: usize = 20;
pub const MAX_RESULTS: usize = 50;
const LONG_TAIL_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompetitionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionLevel::Low => "low",
            CompetitionLevel::Medium => "medium",
            CompetitionLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResearchRequest {
    pub seed_keywords: Vec<String>,
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default)]
    pub competition_level: CompetitionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_market() -> String {
    "global".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl KeywordResearchRequest {
    /// Trimmed, de-duplicated seeds.
    pub fn validate(&self) -> ServiceResult<Vec<String>> {
        let mut seeds: Vec<String> = Vec::new();
        for seed in self.seed_keywords.iter().map(|s| s.trim()) {
            if !seed.is_empty() && !seeds.iter().any(|s| s.eq_ignore_ascii_case(seed)) {
                seeds.push(seed.to_string());
            }
        }

        if seeds.is_empty() {
            return Err(ServiceError::validation(
                "At least one seed keyword is required",
            ));
        }
        if seeds.len() > MAX_SEED_KEYWORDS {
            return Err(ServiceError::validation(format!(
                "Maximum {} seed keywords allowed",
                MAX_SEED_KEYWORDS
            )));
        }
        Ok(seeds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResearch {
    pub seed_keywords: Vec<String>,
    /// Seeds first, then the provider's suggestions.
    pub keywords: Vec<String>,
    pub long_tail: Vec<String>,
    pub market: String,
    pub language: String,
    pub competition_level: CompetitionLevel,
    pub provider: ProviderKind,
}

pub struct KeywordService {
    registry: Arc<ProviderRegistry>,
}

impl KeywordService {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub async fn research(&self, request: KeywordResearchRequest) -> ServiceResult<KeywordResearch> {
        let seeds = request.validate()?;

        let selection = select_text_provider(
            TextSelectionInput {
                hint: request.model.as_deref(),
                language: Some(&request.language),
                long_form: false,
            },
            &self.registry.availability(),
        )?;
        let provider = text_provider(&self.registry, selection.provider, "keyword research")?;
        info!(
            "Researching {} seed keywords with {}",
            seeds.len(),
            selection.provider
        );

        let response = provider
            .generate(TextRequest::new(build_prompt(&request, &seeds)).with_max_tokens(1000))
            .await?;

        let suggestions = parse_keywords(&response.text);
        debug!("Provider suggested {} keywords", suggestions.len());

        let keywords = merge_keywords(&seeds, suggestions);
        let long_tail = keywords
            .iter()
            .filter(|k| k.split_whitespace().count() >= LONG_TAIL_WORDS)
            .cloned()
            .collect();

        Ok(KeywordResearch {
            seed_keywords: seeds,
            keywords,
            long_tail,
            market: request.market,
            language: request.language,
            competition_level: request.competition_level,
            provider: response.provider,
        })
    }
}

fn build_prompt(request: &KeywordResearchRequest, seeds: &[String]) -> String {
    let industry = request
        .industry
        .as_deref()
        .map(|i| format!("\n- Industry: {}", i))
        .unwrap_or_default();

    format!(
        "Suggest SEO keywords related to these seed keywords: {seeds}\n\n\
         Requirements:\n\
         - Market: {market}\n\
         - Language: {language}{industry}\n\
         - Target competition level: {competition}\n\
         - Mix short head terms with long-tail phrases\n\
         - Write keywords in {language}\n\n\
         Respond with a JSON array of strings only, e.g. [\"keyword one\", \"keyword two\"].",
        seeds = seeds.join(", "),
        market = request.market,
        language = language_name(&request.language),
        competition = request.competition_level.as_str(),
    )
}

/// Reads a JSON array out of the reply, or one keyword per line when there is
/// none. Array items may be strings or objects with a `keyword` field.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    if let Some(items) = json_array(raw) {
        return items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(map) => map
                    .get("keyword")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|k| !k.is_empty())
            .collect();
    }

    raw.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty() && !line.ends_with(':') && !line.starts_with("```"))
        .collect()
}

fn json_array(raw: &str) -> Option<Vec<Value>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<Value>>(&raw[start..=end]).ok()
}

/// Strips list markers and quotes: `1. "foo",` becomes `foo`.
fn clean_line(line: &str) -> String {
    let line = line.trim();
    let unnumbered = line.trim_start_matches(|c: char| c.is_ascii_digit());
    // `1. foo` and `2) foo` are list numbering; `1.5 liter` and `.net` are not
    let is_numbered = unnumbered.len() < line.len()
        && unnumbered.starts_with(['.', ')'])
        && unnumbered[1..].starts_with(char::is_whitespace);
    let line = if is_numbered { &unnumbered[1..] } else { line };
    let line = line
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .trim_end_matches(',');
    line.trim_matches(['"', '\'']).trim().to_string()
}

fn merge_keywords(seeds: &[String], suggestions: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = seeds.to_vec();
    for keyword in suggestions {
        if merged.len() >= MAX_RESULTS {
            break;
        }
        if !merged.iter().any(|k| k.eq_ignore_ascii_case(&keyword)) {
            merged.push(keyword);
        }
    }
    merged
}
