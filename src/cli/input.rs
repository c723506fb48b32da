//! Tool request input for the `exec` and `call` commands.
//!
//! A request document is either one `{tool, arguments, context}` object or an
//! array of them. Requests run in document order.

use crate::mcp::ToolRequest;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestSource {
    File(PathBuf),
    Stdin,
    Inline {
        tool: String,
        arguments: String,
        context: Option<String>,
    },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read requests from stdin: {0}")]
    Stdin(std::io::Error),
    #[error("Invalid request document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a JSON object")]
    NotAnObject { field: &'static str },
    #[error("Request document contains no requests")]
    Empty,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestDocument {
    Single(ToolRequest),
    Batch(Vec<ToolRequest>),
}

impl RequestSource {
    pub fn load(&self) -> Result<Vec<ToolRequest>, InputError> {
        match self {
            RequestSource::File(path) => parse_document(&read_file(path)?),
            RequestSource::Stdin => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(InputError::Stdin)?;
                parse_document(&buffer)
            }
            RequestSource::Inline {
                tool,
                arguments,
                context,
            } => {
                let arguments = parse_object(arguments, "--args")?;
                let mut request = ToolRequest::new(tool.clone(), arguments);
                if let Some(context) = context {
                    request = request.with_context(parse_object(context, "--context")?);
                }
                Ok(vec![request])
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_document(raw: &str) -> Result<Vec<ToolRequest>, InputError> {
    let requests = match serde_json::from_str(raw)? {
        RequestDocument::Single(request) => vec![request],
        RequestDocument::Batch(requests) => requests,
    };
    if requests.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(requests)
}

fn parse_object(raw: &str, field: &'static str) -> Result<Value, InputError> {
    let value: Value = serde_json::from_str(raw)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(InputError::NotAnObject { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_single_and_batch_documents() {
        let single = parse_document(r#"{"tool": "analyze_seo", "arguments": {"url": "https://a.b"}}"#)
            .unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].tool, "analyze_seo");

        let batch = parse_document(
            r#"[
                {"tool": "generate_content", "arguments": {"type": "blog", "topic": "x"}},
                {"tool": "translate_thai", "arguments": {"text": "hi"}, "context": {"client_id": "c"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].identifier(), "c");
    }

    #[test]
    fn test_rejects_empty_and_malformed_documents() {
        assert!(matches!(parse_document("[]"), Err(InputError::Empty)));
        assert!(matches!(
            parse_document(r#"{"arguments": {}}"#),
            Err(InputError::Parse(_))
        ));
        assert!(matches!(parse_document("not json"), Err(InputError::Parse(_))));
    }

    #[test]
    fn test_inline_source() {
        let source = RequestSource::Inline {
            tool: "research_keywords".to_string(),
            arguments: r#"{"seed_keywords": ["coffee"]}"#.to_string(),
            context: Some(r#"{"api_key": "k"}"#.to_string()),
        };
        let requests = source.load().unwrap();
        assert_eq!(requests[0].arguments["seed_keywords"][0], "coffee");
        assert_eq!(requests[0].identifier(), "k");

        let bad = RequestSource::Inline {
            tool: "research_keywords".to_string(),
            arguments: "[1, 2]".to_string(),
            context: None,
        };
        let err = bad.load().unwrap_err();
        assert_eq!(err.to_string(), "--args must be a JSON object");
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"tool": "generate_image", "arguments": {{"prompt": "a fox"}}}}"#).unwrap();

        let requests = RequestSource::File(file.path().to_path_buf()).load().unwrap();
        assert_eq!(requests[0].tool, "generate_image");

        let missing = RequestSource::File(PathBuf::from("/nonexistent/requests.json")).load();
        assert!(matches!(missing, Err(InputError::Read { .. })));
    }
}
