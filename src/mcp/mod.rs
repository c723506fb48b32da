//! # Tool Orchestration
//!
//! The [`ServiceManager`] is the single entry point callers use: it accepts a
//! [`ToolRequest`] (`{tool, arguments, context}`), routes it to a capability
//! service and always answers with a [`ToolResponse`] envelope.
//!
//! ## Call pipeline
//!
//! ```text
//! ToolRequest
//!   -> initialized?          NOT_INITIALIZED
//!   -> Tool::parse           VALIDATION_ERROR (unknown tool)
//!   -> rate limiter          RATE_LIMITED
//!   -> parse_arguments       VALIDATION_ERROR (missing/invalid argument)
//!   -> cache lookup          hit: cached = true
//!   -> service + provider    CONFIGURATION_ERROR / PROVIDER_ERROR / TIMEOUT
//!   -> ToolResponse
//! ```
//!
//! ## Tools
//!
//! | Tool                | Service     | Rate bucket        | Cached |
//! |---------------------|-------------|--------------------|--------|
//! | `generate_content`  | content     | content_generation | yes    |
//! | `analyze_seo`       | seo         | general            | yes    |
//! | `generate_image`    | image       | image_generation   | yes    |
//! | `wordpress_sync`    | wordpress   | general            | no     |
//! | `translate_thai`    | translation | general            | yes    |
//! | `research_keywords` | keywords    | general            | yes    |
//!
//! Legacy names `blog_generator`, `seo_analyzer` and `flux_image_gen` resolve
//! to the same tools (with `type = blog` and `model = flux` filled in).

pub mod manager;
pub mod tools;
pub mod types;

pub use manager::{SERVICE_NAMES, ServiceManager};
pub use tools::{LegacyAlias, RateCategory, Tool, ToolDefinition, catalogue, parse_arguments};
pub use types::{ToolRequest, ToolResponse};
