//! CLI-specific functionality for seoforge
//!
//! This module contains argument parsing and tool request input handling.
//! Configuration discovery lives in [`crate::config`].

pub mod args;
pub mod input;

pub use args::{Args, Commands, ExecuteConfig, ExecutionMode};
pub use input::{InputError, RequestSource, parse_document};
