//! Command line argument parsing
//!
//! Subcommands:
//! - `tools`: List the tool catalogue with input schemas
//! - `status`: Show service and provider availability
//! - `exec`: Execute tool requests read from a JSON file or stdin
//! - `call`: Execute a single tool with inline JSON arguments
//! - `show-config`: Show configuration discovery information
//! - `init-config`: Write a default user configuration file

use super::input::RequestSource;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    ListTools,
    Status,
    Execute(ExecuteConfig),
    ShowConfig,
    InitConfig,
}

#[derive(Debug)]
pub struct ExecuteConfig {
    pub source: RequestSource,
    /// Pretty-print response envelopes
    pub pretty: bool,
}

#[derive(Debug, Parser)]
#[command(name = "seoforge")]
#[command(author = "SEO Forge Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI service orchestration for SEO content, image and translation tools")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available tools and their input schemas
    Tools,
    /// Show service and provider availability
    Status,
    /// Execute tool requests from a JSON file (a request or an array of requests)
    Exec {
        /// Request file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        /// Pretty-print responses
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },
    /// Call one tool with inline JSON arguments
    Call {
        /// Tool name, e.g. generate_content
        tool: String,
        /// Arguments as a JSON object
        #[arg(short = 'a', long = "args", value_name = "JSON", default_value = "{}")]
        arguments: String,
        /// Caller context as a JSON object (api_key, client_id)
        #[arg(long = "context", value_name = "JSON")]
        context: Option<String>,
        /// Pretty-print the response
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },
    /// Show configuration discovery information
    ShowConfig,
    /// Create ~/.seoforge/config.toml with default settings
    InitConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Tools) => Ok(ExecutionMode::ListTools),
            Some(Commands::Status) => Ok(ExecutionMode::Status),
            Some(Commands::Exec { file, pretty }) => {
                let source = match file {
                    Some(path) if path.as_os_str() != "-" => RequestSource::File(path.clone()),
                    _ => RequestSource::Stdin,
                };
                Ok(ExecutionMode::Execute(ExecuteConfig {
                    source,
                    pretty: *pretty,
                }))
            }
            Some(Commands::Call {
                tool,
                arguments,
                context,
                pretty,
            }) => {
                if tool.trim().is_empty() {
                    return Err("Tool name cannot be empty".to_string());
                }
                Ok(ExecutionMode::Execute(ExecuteConfig {
                    source: RequestSource::Inline {
                        tool: tool.clone(),
                        arguments: arguments.clone(),
                        context: context.clone(),
                    },
                    pretty: *pretty,
                }))
            }
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            Some(Commands::InitConfig) => Ok(ExecutionMode::InitConfig),
            None => Err(
                "No command specified. Use 'seoforge --help' to see available commands."
                    .to_string(),
            ),
        }
    }

    /// Tracing filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "seoforge=debug"
        } else {
            "seoforge=info"
        }
    }
}
