use crate::error::{ErrorCode, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

/// Inbound call: `{tool, arguments, context}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl ToolRequest {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        if let Value::Object(map) = context {
            self.context = Some(map);
        }
        self
    }

    /// Rate-limit identity: context `api_key`, then `client_id`, else anonymous.
    pub fn identifier(&self) -> String {
        self.context
            .as_ref()
            .and_then(|context| {
                ["api_key", "client_id"].iter().find_map(|field| {
                    context
                        .get(*field)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                })
            })
            .unwrap_or(ANONYMOUS_IDENTIFIER)
            .to_string()
    }
}

/// Uniform result envelope. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    pub tool: String,
    /// Wall-clock milliseconds from dispatch to completion.
    pub execution_time: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cached: bool,
}

impl ToolResponse {
    pub fn success(tool: impl Into<String>, result: Value, elapsed: Duration, cached: bool) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            error_code: None,
            tool: tool.into(),
            execution_time: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
            cached,
        }
    }

    pub fn failure(tool: impl Into<String>, error: &ServiceError, elapsed: Duration) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
            error_code: Some(error.code()),
            tool: tool.into(),
            execution_time: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
            cached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_precedence() {
        let request = ToolRequest::new("analyze_seo", json!({}));
        assert_eq!(request.identifier(), "anonymous");

        let with_client = request.clone().with_context(json!({"client_id": "site-1"}));
        assert_eq!(with_client.identifier(), "site-1");

        let with_key = request
            .clone()
            .with_context(json!({"client_id": "site-1", "api_key": "k-123"}));
        assert_eq!(with_key.identifier(), "k-123");

        let blank_key = request.with_context(json!({"api_key": "  ", "client_id": 7}));
        assert_eq!(blank_key.identifier(), "anonymous");
    }

    #[test]
    fn test_envelope_shape() {
        let ok = ToolResponse::success(
            "generate_content",
            json!({"title": "x"}),
            Duration::from_millis(12),
            true,
        );
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["executionTime"], 12);
        assert_eq!(value["cached"], true);
        assert!(value.get("error").is_none());
        assert!(value["timestamp"].is_string());

        let err = ToolResponse::failure(
            "nope",
            &ServiceError::unknown_tool("nope"),
            Duration::from_millis(0),
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Unknown tool: nope");
        assert_eq!(value["errorCode"], "VALIDATION_ERROR");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_request_parses_without_arguments() {
        let request: ToolRequest = serde_json::from_str(r#"{"tool": "research_keywords"}"#).unwrap();
        assert!(request.arguments.is_empty());
        assert!(request.context.is_none());
    }
}
