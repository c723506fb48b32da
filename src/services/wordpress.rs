//! Publishing to WordPress sites through the REST API.

use crate::env::endpoints::USER_AGENT;
use crate::error::{ServiceError, ServiceResult};
use crate::llm::http::extract_error_message;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const REST_PREFIX: &str = "wp-json/wp/v2";

/// Transport to a WordPress REST API.
#[async_trait::async_trait]
pub trait WordPressApi: Send + Sync {
    /// Whether `{site}/wp-json/wp/v2/` answers with 200.
    async fn validate_site(&self, site_url: &str) -> bool;

    async fn send(
        &self,
        method: Method,
        url: &str,
        auth_token: Option<&str>,
        body: Option<&Value>,
    ) -> ServiceResult<Value>;
}

pub struct HttpWordPressApi {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpWordPressApi {
    pub fn new(timeout: Duration) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait::async_trait]
impl WordPressApi for HttpWordPressApi {
    async fn validate_site(&self, site_url: &str) -> bool {
        let probe = format!("{}/{}/", site_url, REST_PREFIX);
        match self.client.get(&probe).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!("WordPress site probe failed: {}", e.without_url());
                false
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        auth_token: Option<&str>,
        body: Option<&Value>,
    ) -> ServiceResult<Value> {
        let mut builder = self.client.request(method, url);
        if let Some(token) = auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(format!(
                    "WordPress request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else {
                ServiceError::Provider(format!("WordPress API error: {}", e.without_url()))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Provider(format!("WordPress API error: {}", e)))?;

        if !status.is_success() {
            let message = extract_error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ServiceError::Provider(format!(
                "WordPress API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ServiceError::Provider(format!("WordPress returned invalid JSON: {}", e))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordPressAction {
    Create,
    Update,
    Delete,
}

impl WordPressAction {
    fn past_tense(&self) -> &'static str {
        match self {
            WordPressAction::Create => "created",
            WordPressAction::Update => "updated",
            WordPressAction::Delete => "deleted",
        }
    }
}

impl fmt::Display for WordPressAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WordPressAction::Create => "create",
            WordPressAction::Update => "update",
            WordPressAction::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordPressContentType {
    Post,
    Page,
    /// WooCommerce product.
    Product,
}

impl WordPressContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordPressContentType::Post => "post",
            WordPressContentType::Page => "page",
            WordPressContentType::Product => "product",
        }
    }

    fn collection(&self) -> &'static str {
        match self {
            WordPressContentType::Post => "posts",
            WordPressContentType::Page => "pages",
            WordPressContentType::Product => "products",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressRequest {
    pub site_url: String,
    pub action: WordPressAction,
    pub content_type: WordPressContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
}

impl WordPressRequest {
    /// Normalized site root without a trailing slash.
    pub fn validate(&self) -> ServiceResult<String> {
        let site = self.site_url.trim().trim_end_matches('/');
        let parsed = Url::parse(site)
            .map_err(|e| ServiceError::validation(format!("Invalid site_url '{}': {}", site, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServiceError::validation(format!(
                "Unsupported site_url scheme '{}'",
                parsed.scheme()
            )));
        }

        if matches!(self.action, WordPressAction::Update | WordPressAction::Delete)
            && self.post_id.is_none()
        {
            return Err(ServiceError::validation(format!(
                "Post ID required for {} operation",
                self.action
            )));
        }

        if let Some(content) = &self.content
            && !content.is_object()
        {
            return Err(ServiceError::validation("content must be an object"));
        }

        Ok(site.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPressResult {
    pub action: WordPressAction,
    pub content_type: WordPressContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    pub data: Value,
    pub message: String,
}

pub struct WordPressService {
    api: Arc<dyn WordPressApi>,
}

impl WordPressService {
    pub fn new(api: Arc<dyn WordPressApi>) -> Self {
        Self { api }
    }

    pub async fn sync(&self, request: WordPressRequest) -> ServiceResult<WordPressResult> {
        let site = request.validate()?;

        if !self.api.validate_site(&site).await {
            return Err(ServiceError::Provider(
                "Invalid WordPress site or REST API not accessible".to_string(),
            ));
        }

        let collection = format!("{}/{}/{}", site, REST_PREFIX, request.content_type.collection());
        let token = request.auth_token.as_deref().filter(|t| !t.is_empty());
        let empty = Value::Object(Map::new());
        let content = request.content.as_ref().unwrap_or(&empty);

        let (method, url, body) = match (request.action, request.post_id) {
            (WordPressAction::Create, _) => (
                Method::POST,
                collection,
                Some(format_payload(content, request.content_type)),
            ),
            (WordPressAction::Update, Some(id)) => (
                Method::POST,
                format!("{}/{}", collection, id),
                Some(format_payload(content, request.content_type)),
            ),
            (WordPressAction::Delete, Some(id)) => {
                (Method::DELETE, format!("{}/{}", collection, id), None)
            }
            (action, None) => {
                return Err(ServiceError::validation(format!(
                    "Post ID required for {} operation",
                    action
                )));
            }
        };

        info!(
            "WordPress {} {} on {}",
            request.action,
            request.content_type.as_str(),
            site
        );
        let data = self.api.send(method, &url, token, body.as_ref()).await?;

        let post_id = data.get("id").and_then(Value::as_u64).or(request.post_id);
        Ok(WordPressResult {
            action: request.action,
            content_type: request.content_type,
            post_id,
            data,
            message: format!(
                "{} {} successfully",
                request.content_type.as_str(),
                request.action.past_tense()
            ),
        })
    }
}

/// Shapes caller content into the REST payload for the content type.
pub fn format_payload(content: &Value, content_type: WordPressContentType) -> Value {
    let field = |name: &str| content.get(name).filter(|v| !is_blank(v));
    let text = |name: &str, default: &str| {
        field(name)
            .cloned()
            .unwrap_or_else(|| Value::String(default.to_string()))
    };
    let or = |name: &str, default: Value| field(name).cloned().unwrap_or(default);

    let mut payload = json!({
        "title": text("title", "Untitled"),
        "content": field("content").or_else(|| field("body")).cloned().unwrap_or_else(|| json!("")),
        "status": text("status", "draft"),
        "excerpt": text("excerpt", ""),
        "meta": or("meta", json!({})),
    });

    let extra = match content_type {
        WordPressContentType::Post => json!({
            "categories": or("categories", json!([])),
            "tags": or("tags", json!([])),
            "featured_media": or("featured_image", json!(0)),
        }),
        WordPressContentType::Page => json!({
            "parent": or("parent", json!(0)),
            "menu_order": or("menu_order", json!(0)),
        }),
        WordPressContentType::Product => json!({
            "type": "simple",
            "regular_price": text("price", "0"),
            "description": text("description", ""),
            "short_description": text("short_description", ""),
            "categories": or("categories", json!([])),
            "images": or("images", json!([])),
        }),
    };

    if let (Some(base), Value::Object(extra)) = (payload.as_object_mut(), extra) {
        base.extend(extra);
    }
    payload
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        reject_site: bool,
        calls: Mutex<Vec<(Method, String, Option<String>, Option<Value>)>>,
    }

    #[async_trait::async_trait]
    impl WordPressApi for RecordingApi {
        async fn validate_site(&self, _site_url: &str) -> bool {
            !self.reject_site
        }

        async fn send(
            &self,
            method: Method,
            url: &str,
            auth_token: Option<&str>,
            body: Option<&Value>,
        ) -> ServiceResult<Value> {
            self.calls.lock().unwrap().push((
                method,
                url.to_string(),
                auth_token.map(str::to_string),
                body.cloned(),
            ));
            Ok(json!({"id": 42, "status": "draft"}))
        }
    }

    fn request(action: WordPressAction, post_id: Option<u64>) -> WordPressRequest {
        WordPressRequest {
            site_url: "https://shop.example.com/".to_string(),
            action,
            content_type: WordPressContentType::Post,
            content: Some(json!({"title": "Hello", "body": "<p>Hi</p>", "tags": [3]})),
            auth_token: Some("secret".to_string()),
            post_id,
        }
    }

    #[test]
    fn test_payload_shapes() {
        let post = format_payload(
            &json!({"title": "", "body": "text", "featured_image": 9}),
            WordPressContentType::Post,
        );
        assert_eq!(post["title"], "Untitled");
        assert_eq!(post["content"], "text");
        assert_eq!(post["status"], "draft");
        assert_eq!(post["featured_media"], 9);
        assert_eq!(post["categories"], json!([]));

        let page = format_payload(&json!({"parent": 5}), WordPressContentType::Page);
        assert_eq!(page["parent"], 5);
        assert_eq!(page["menu_order"], 0);
        assert!(page.get("tags").is_none());

        let product = format_payload(&json!({"price": "19.99"}), WordPressContentType::Product);
        assert_eq!(product["type"], "simple");
        assert_eq!(product["regular_price"], "19.99");
    }

    #[tokio::test]
    async fn test_update_without_post_id_makes_no_call() {
        let api = Arc::new(RecordingApi::default());
        let service = WordPressService::new(api.clone());

        let err = service
            .sync(request(WordPressAction::Update, None))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Post ID required for update operation"));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_posts_to_collection() {
        let api = Arc::new(RecordingApi::default());
        let service = WordPressService::new(api.clone());

        let result = service
            .sync(request(WordPressAction::Create, None))
            .await
            .unwrap();

        assert_eq!(result.post_id, Some(42));
        assert_eq!(result.message, "post created successfully");

        let calls = api.calls.lock().unwrap();
        let (method, url, token, body) = &calls[0];
        assert_eq!(*method, Method::POST);
        assert_eq!(url, "https://shop.example.com/wp-json/wp/v2/posts");
        assert_eq!(token.as_deref(), Some("secret"));
        assert_eq!(body.as_ref().unwrap()["content"], "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_delete_targets_item() {
        let api = Arc::new(RecordingApi::default());
        let service = WordPressService::new(api.clone());

        service
            .sync(request(WordPressAction::Delete, Some(7)))
            .await
            .unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0].0, Method::DELETE);
        assert_eq!(calls[0].1, "https://shop.example.com/wp-json/wp/v2/posts/7");
        assert!(calls[0].3.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_site_is_rejected() {
        let api = Arc::new(RecordingApi {
            reject_site: true,
            ..Default::default()
        });
        let service = WordPressService::new(api.clone());

        let err = service
            .sync(request(WordPressAction::Create, None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("REST API not accessible"));
        assert!(api.calls.lock().unwrap().is_empty());
    }
}
