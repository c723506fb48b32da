//! Environment constants and path utilities.
//!
//! This module centralizes the credential variable names, vendor endpoints and
//! configuration paths used throughout the crate.

/// Main application directory name (hidden directory like .git, .vscode)
pub const SEOFORGE_DIR_NAME: &str = ".seoforge";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up directly in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "seoforge.toml";

/// Environment variables holding provider credentials
pub mod credentials {
    /// Google Gemini API key
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

    /// OpenAI API key (chat completions and DALL-E)
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

    /// Anthropic API key
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

    /// Replicate API token (Flux and Openjourney image models)
    pub const REPLICATE_API_TOKEN: &str = "REPLICATE_API_TOKEN";
}

/// Default vendor endpoints
pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    pub const REPLICATE_BASE_URL: &str = "https://api.replicate.com";

    /// Anthropic API version header value
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";

    /// User agent sent to vendor APIs and WordPress sites
    pub const USER_AGENT: &str = concat!("SEOForge-MCP/", env!("CARGO_PKG_VERSION"));
}

/// Default model identifiers per vendor
pub mod models {
    pub const GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
    pub const OPENAI_CHAT_MODEL: &str = "gpt-4";
    pub const ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
    pub const DALLE_MODEL: &str = "dall-e-3";
    pub const FLUX_MODEL: &str = "black-forest-labs/flux-schnell";
    pub const OPENJOURNEY_MODEL: &str = "prompthero/openjourney";
}

/// Common path utilities
use std::path::{Path, PathBuf};

/// Build the main .seoforge directory path from a root directory
pub fn seoforge_dir_path(root: &Path) -> PathBuf {
    root.join(SEOFORGE_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    seoforge_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    seoforge_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let home_dir = Path::new("/home/user");
        let current_dir = Path::new("/current/project");

        assert_eq!(
            user_config_file_path(home_dir),
            Path::new("/home/user/.seoforge/config.toml")
        );

        assert_eq!(
            local_config_file_path(current_dir),
            Path::new("/current/project/.seoforge/config.toml")
        );
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(endpoints::USER_AGENT.starts_with("SEOForge-MCP/"));
    }
}
