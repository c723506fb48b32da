//! # SEO Forge
//!
//! AI service orchestration for SEO tooling. A single [`ServiceManager`]
//! accepts tool calls (`generate_content`, `analyze_seo`, `generate_image`,
//! `wordpress_sync`, `translate_thai`, `research_keywords`), routes each one to
//! the best configured AI vendor and answers with a uniform [`ToolResponse`]
//! envelope.
//!
//! ## Architecture Overview
//!
//! - **[`mcp`]**: Tool catalogue, request/response envelope and the orchestrator
//! - **[`services`]**: Content, SEO, image, translation, keyword and WordPress services
//! - **[`llm`]**: Vendor adapters (Gemini, OpenAI, Anthropic, Replicate, DALL-E) and selection policy
//! - **[`cache`]**: In-process TTL cache with pattern invalidation
//! - **[`rate_limiter`]**: Fixed-window request counters per caller
//! - **[`analysis`]**: Keyword density, readability and SEO scoring
//!
//! ## Features
//!
//! ### 🧭 Provider Routing
//! - **Deterministic Selection**: Thai content prefers Gemini, long-form prefers Anthropic
//! - **Image Styles**: Realistic prompts go to Flux, artistic ones to the Midjourney-style model
//! - **Explicit Hints**: A `model` argument wins whenever that vendor is configured
//!
//! ### ⚡ Caching and Limits
//! - **Per-Tool TTLs**: Content, SEO, keywords, translations and images cached separately
//! - **Site Invalidation**: WordPress writes drop every cached entry for the site
//! - **Rate Buckets**: Content, image and general calls limited per API key or client id
//!
//! ### 🇹🇭 Thai Localization
//! - **Glossary Annotation**: Common business terms kept consistent across translations
//! - **Cultural Notes**: Hints for formality, pricing and quality wording
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seoforge::{ServiceConfig, ServiceManager, ToolRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = ServiceManager::from_env(ServiceConfig::default())?;
//!     manager.initialize().await?;
//!
//!     let response = manager
//!         .execute_tool(ToolRequest::new(
//!             "generate_content",
//!             json!({"type": "blog", "topic": "Cold brew at home"}),
//!         ))
//!         .await;
//!
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```

/// Content analysis: word counts, keyword density, readability and SEO score.
pub mod analysis;

/// Generic TTL cache and cache key derivation.
pub mod cache;

/// Time source abstraction used by the cache and rate limiter.
pub mod clock;

/// Service configuration, credentials and configuration discovery.
pub mod config;

/// Environment constants and path utilities.
///
/// Centralizes credential variable names, vendor endpoints, default models and
/// configuration paths.
pub mod env;

/// Service error taxonomy and envelope error codes.
pub mod error;

/// Vendor adapters and the provider selection policy.
pub mod llm;

/// Tool orchestration: catalogue, envelope and [`ServiceManager`].
pub mod mcp;

/// Fixed-window rate limiting.
pub mod rate_limiter;

/// Capability services behind each tool.
pub mod services;

// CLI module for command-line interface
pub mod cli;

pub use config::{ConfigDiscovery, Credentials, ServiceConfig};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use llm::{ImageModel, ProviderError, ProviderKind, ProviderRegistry};
pub use mcp::{ServiceManager, Tool, ToolDefinition, ToolRequest, ToolResponse};
