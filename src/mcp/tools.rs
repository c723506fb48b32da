//! Tool names, the static catalogue and argument decoding.

use crate::config::{CacheConfig, RateLimitConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::llm::ImageSize;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GenerateContent,
    AnalyzeSeo,
    GenerateImage,
    WordPressSync,
    TranslateThai,
    ResearchKeywords,
}

/// Older tool names kept for existing callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAlias {
    BlogGenerator,
    SeoAnalyzer,
    FluxImageGen,
}

impl LegacyAlias {
    pub const ALL: [LegacyAlias; 3] = [
        LegacyAlias::BlogGenerator,
        LegacyAlias::SeoAnalyzer,
        LegacyAlias::FluxImageGen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LegacyAlias::BlogGenerator => "blog_generator",
            LegacyAlias::SeoAnalyzer => "seo_analyzer",
            LegacyAlias::FluxImageGen => "flux_image_gen",
        }
    }

    pub fn target(&self) -> Tool {
        match self {
            LegacyAlias::BlogGenerator => Tool::GenerateContent,
            LegacyAlias::SeoAnalyzer => Tool::AnalyzeSeo,
            LegacyAlias::FluxImageGen => Tool::GenerateImage,
        }
    }

    /// Fills in the argument the alias implied, unless the caller set it.
    pub fn apply_defaults(&self, arguments: &mut Map<String, Value>) {
        let (field, value) = match self {
            LegacyAlias::BlogGenerator => ("type", "blog"),
            LegacyAlias::FluxImageGen => ("model", "flux"),
            LegacyAlias::SeoAnalyzer => return,
        };
        let missing = arguments.get(field).is_none_or(Value::is_null);
        if missing {
            arguments.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
}

/// Limit bucket a tool counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateCategory {
    ContentGeneration,
    ImageGeneration,
    General,
}

impl RateCategory {
    pub const ALL: [RateCategory; 3] = [
        RateCategory::ContentGeneration,
        RateCategory::ImageGeneration,
        RateCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateCategory::ContentGeneration => "content_generation",
            RateCategory::ImageGeneration => "image_generation",
            RateCategory::General => "general",
        }
    }

    pub fn limit(&self, config: &RateLimitConfig) -> u32 {
        match self {
            RateCategory::ContentGeneration => config.content_generation,
            RateCategory::ImageGeneration => config.image_generation,
            RateCategory::General => config.general,
        }
    }
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::GenerateContent,
        Tool::AnalyzeSeo,
        Tool::GenerateImage,
        Tool::WordPressSync,
        Tool::TranslateThai,
        Tool::ResearchKeywords,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GenerateContent => "generate_content",
            Tool::AnalyzeSeo => "analyze_seo",
            Tool::GenerateImage => "generate_image",
            Tool::WordPressSync => "wordpress_sync",
            Tool::TranslateThai => "translate_thai",
            Tool::ResearchKeywords => "research_keywords",
        }
    }

    /// Resolves a canonical name or legacy alias.
    pub fn parse(name: &str) -> ServiceResult<(Tool, Option<LegacyAlias>)> {
        let name = name.trim();
        if let Some(tool) = Self::ALL.into_iter().find(|t| t.name() == name) {
            return Ok((tool, None));
        }
        LegacyAlias::ALL
            .into_iter()
            .find(|alias| alias.name() == name)
            .map(|alias| (alias.target(), Some(alias)))
            .ok_or_else(|| ServiceError::unknown_tool(name))
    }

    pub fn required_arguments(&self) -> &'static [&'static str] {
        match self {
            Tool::GenerateContent => &["type", "topic"],
            // Needs `url` or `content`; checked by the SEO service.
            Tool::AnalyzeSeo => &[],
            Tool::GenerateImage => &["prompt"],
            Tool::WordPressSync => &["site_url", "action", "content_type"],
            Tool::TranslateThai => &["text"],
            Tool::ResearchKeywords => &["seed_keywords"],
        }
    }

    pub fn rate_category(&self) -> RateCategory {
        match self {
            Tool::GenerateContent => RateCategory::ContentGeneration,
            Tool::GenerateImage => RateCategory::ImageGeneration,
            _ => RateCategory::General,
        }
    }

    /// How long a successful result stays cached; `None` for side-effecting tools.
    pub fn cache_ttl(&self, config: &CacheConfig) -> Option<Duration> {
        let secs = match self {
            Tool::GenerateContent => config.content_ttl_secs,
            Tool::AnalyzeSeo => config.seo_ttl_secs,
            Tool::GenerateImage => config.image_ttl_secs,
            Tool::TranslateThai => config.translation_ttl_secs,
            Tool::ResearchKeywords => config.keywords_ttl_secs,
            Tool::WordPressSync => return None,
        };
        Some(Duration::from_secs(secs))
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::GenerateContent => "Generate SEO-optimized content for various purposes",
            Tool::AnalyzeSeo => "Perform comprehensive SEO analysis",
            Tool::GenerateImage => "Generate images using AI models",
            Tool::WordPressSync => "Sync content with WordPress sites",
            Tool::TranslateThai => "Translate and localize content for Thai market",
            Tool::ResearchKeywords => "Research and analyze keywords for SEO",
        }
    }

    pub fn input_schema(&self) -> Value {
        let strings = json!({ "type": "array", "items": { "type": "string" } });
        match self {
            Tool::GenerateContent => json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["blog", "product", "category", "meta"] },
                    "topic": { "type": "string", "maxLength": 500 },
                    "keywords": { "type": "array", "items": { "type": "string" }, "maxItems": 10 },
                    "language": { "type": "string", "default": "en" },
                    "tone": { "type": "string", "default": "professional" },
                    "length": { "type": "string", "enum": ["short", "medium", "long"], "default": "medium" },
                    "model": { "type": "string" }
                },
                "required": self.required_arguments()
            }),
            Tool::AnalyzeSeo => json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "format": "uri" },
                    "content": { "type": "string" },
                    "keywords": strings
                },
                "anyOf": [ { "required": ["url"] }, { "required": ["content"] } ]
            }),
            Tool::GenerateImage => json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "style": { "type": "string", "default": "realistic" },
                    "size": { "type": "string", "enum": ImageSize::SUPPORTED, "default": "1024x1024" },
                    "model": { "type": "string", "enum": ["flux", "dalle", "midjourney"] },
                    "negative_prompt": { "type": "string" },
                    "steps": { "type": "integer", "minimum": 1, "maximum": 100 },
                    "guidance_scale": { "type": "number" }
                },
                "required": self.required_arguments()
            }),
            Tool::WordPressSync => json!({
                "type": "object",
                "properties": {
                    "site_url": { "type": "string", "format": "uri" },
                    "action": { "type": "string", "enum": ["create", "update", "delete"] },
                    "content_type": { "type": "string", "enum": ["post", "page", "product"] },
                    "content": { "type": "object" },
                    "auth_token": { "type": "string" },
                    "post_id": { "type": "integer" }
                },
                "required": self.required_arguments()
            }),
            Tool::TranslateThai => json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "source_language": { "type": "string", "default": "en" },
                    "target_language": { "type": "string", "default": "th" },
                    "context": { "type": "string" },
                    "cultural_adaptation": { "type": "boolean", "default": true },
                    "model": { "type": "string" }
                },
                "required": self.required_arguments()
            }),
            Tool::ResearchKeywords => json!({
                "type": "object",
                "properties": {
                    "seed_keywords": strings,
                    "market": { "type": "string", "default": "global" },
                    "language": { "type": "string", "default": "en" },
                    "industry": { "type": "string" },
                    "competition_level": { "type": "string", "enum": ["low", "medium", "high"], "default": "medium" },
                    "model": { "type": "string" }
                },
                "required": self.required_arguments()
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalogue entry returned by `list_tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub fn catalogue() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

/// Checks required fields, then decodes the arguments into the service request.
pub fn parse_arguments<T: DeserializeOwned>(
    tool: Tool,
    arguments: &Map<String, Value>,
) -> ServiceResult<T> {
    if let Some(missing) = tool
        .required_arguments()
        .iter()
        .find(|field| arguments.get(**field).is_none_or(Value::is_null))
    {
        return Err(ServiceError::missing_argument(missing));
    }

    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| {
        ServiceError::validation(format!("Invalid arguments for {}: {}", tool, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ContentRequest, ImageGenerationRequest};

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(
            Tool::parse("generate_content").unwrap(),
            (Tool::GenerateContent, None)
        );
        assert_eq!(
            Tool::parse("flux_image_gen").unwrap(),
            (Tool::GenerateImage, Some(LegacyAlias::FluxImageGen))
        );
        let err = Tool::parse("summon_demon").unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: summon_demon");
    }

    #[test]
    fn test_alias_defaults_do_not_override_caller() {
        let mut args = Map::new();
        LegacyAlias::BlogGenerator.apply_defaults(&mut args);
        assert_eq!(args["type"], "blog");

        let mut args = Map::new();
        args.insert("model".to_string(), json!("dalle"));
        LegacyAlias::FluxImageGen.apply_defaults(&mut args);
        assert_eq!(args["model"], "dalle");
    }

    #[test]
    fn test_missing_required_argument() {
        let args = json!({"type": "blog"}).as_object().cloned().unwrap();
        let err = parse_arguments::<ContentRequest>(Tool::GenerateContent, &args).unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: topic");

        let null_prompt = json!({"prompt": null}).as_object().cloned().unwrap();
        assert!(parse_arguments::<ImageGenerationRequest>(Tool::GenerateImage, &null_prompt).is_err());
    }

    #[test]
    fn test_wrong_shape_is_a_validation_error() {
        let args = json!({"type": "blog", "topic": 42}).as_object().cloned().unwrap();
        let err = parse_arguments::<ContentRequest>(Tool::GenerateContent, &args).unwrap_err();
        assert!(err.to_string().starts_with("Invalid arguments for generate_content"));
    }

    #[test]
    fn test_catalogue_lists_canonical_tools() {
        let tools = catalogue();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "generate_content",
                "analyze_seo",
                "generate_image",
                "wordpress_sync",
                "translate_thai",
                "research_keywords"
            ]
        );
        assert_eq!(tools[0].input_schema["required"], json!(["type", "topic"]));
        let value = serde_json::to_value(&tools[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
    }

    #[test]
    fn test_categories_and_ttls() {
        assert_eq!(Tool::GenerateContent.rate_category(), RateCategory::ContentGeneration);
        assert_eq!(Tool::TranslateThai.rate_category(), RateCategory::General);
        let cache = CacheConfig::default();
        assert!(Tool::WordPressSync.cache_ttl(&cache).is_none());
        assert_eq!(
            Tool::ResearchKeywords.cache_ttl(&cache),
            Some(Duration::from_secs(86_400))
        );
    }
}
