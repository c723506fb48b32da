use crate::analysis::{ContentAnalyzer, strip_html};
use crate::env::endpoints::USER_AGENT;
use crate::error::{ServiceError, ServiceResult};
use crate::llm::http::extract_error_message;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const MIN_TITLE_CHARS: usize = 30;
const MAX_TITLE_CHARS: usize = 60;

static TITLE_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok());
static META_DESCRIPTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s[^>]*name\s*=\s*["']description["'][^>]*>"#).ok()
});
static H1_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)<h1[\s>]").ok());
static NON_CONTENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|head)[^>]*>.*?</(script|style|head)>").ok()
});

/// Retrieves the HTML of a page to analyse.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> ServiceResult<String>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPageFetcher {
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
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> ServiceResult<String> {
        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(format!(
                    "Fetching {} timed out after {}s",
                    url,
                    self.timeout.as_secs()
                ))
            } else {
                ServiceError::Provider(format!("Failed to fetch {}: {}", url, e.without_url()))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Provider(format!("Failed to read {}: {}", url, e.without_url())))?;

        if !status.is_success() {
            let reason = extract_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ServiceError::Provider(format!(
                "Fetching {} returned {}: {}",
                url,
                status.as_u16(),
                reason
            )));
        }
        Ok(body)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SeoRequest {
    /// Returns the URL to fetch when no content was supplied.
    pub fn validate(&self) -> ServiceResult<Option<Url>> {
        let has_content = self.content.as_deref().is_some_and(|c| !c.trim().is_empty());
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty());

        let parsed = match url {
            Some(raw) => Some(parse_page_url(raw)?),
            None if has_content => None,
            None => return Err(ServiceError::missing_argument("url")),
        };

        Ok(if has_content { None } else { parsed })
    }
}

fn parse_page_url(raw: &str) -> ServiceResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ServiceError::validation(format!("Invalid url '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ServiceError::validation(format!(
            "Unsupported url scheme '{}'",
            scheme
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnPageReport {
    pub title: Option<String>,
    pub title_length: usize,
    pub has_meta_description: bool,
    pub h1_count: usize,
}

impl OnPageReport {
    pub fn inspect(html: &str) -> Self {
        let title = TITLE_TAG
            .as_ref()
            .and_then(|re| re.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty());

        Self {
            title_length: title.as_deref().map_or(0, |t| t.chars().count()),
            title,
            has_meta_description: META_DESCRIPTION.as_ref().is_some_and(|re| re.is_match(html)),
            h1_count: H1_TAG.as_ref().map_or(0, |re| re.find_iter(html).count()),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        let mut suggestions = Vec::new();
        match self.title_length {
            0 => suggestions.push("Add a <title> tag to the page.".to_string()),
            n if n < MIN_TITLE_CHARS => suggestions.push(format!(
                "Title is short ({} characters). Aim for {}-{}.",
                n, MIN_TITLE_CHARS, MAX_TITLE_CHARS
            )),
            n if n > MAX_TITLE_CHARS => suggestions.push(format!(
                "Title is long ({} characters). Aim for {}-{}.",
                n, MIN_TITLE_CHARS, MAX_TITLE_CHARS
            )),
            _ => {}
        }
        if !self.has_meta_description {
            suggestions.push("Add a meta description.".to_string());
        }
        match self.h1_count {
            0 => suggestions.push("Add a single H1 heading.".to_string()),
            1 => {}
            n => suggestions.push(format!("Use a single H1 heading (found {}).", n)),
        }
        suggestions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub seo_score: u32,
    pub suggestions: Vec<String>,
    pub word_count: usize,
    pub keyword_density: BTreeMap<String, f64>,
    pub readability_score: f64,
    /// Present when the input was HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_page: Option<OnPageReport>,
}

pub struct SeoService {
    fetcher: Arc<dyn PageFetcher>,
    analyzer: ContentAnalyzer,
}

impl SeoService {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            analyzer: ContentAnalyzer::new(),
        }
    }

    pub async fn analyze(&self, request: SeoRequest) -> ServiceResult<SeoAnalysis> {
        let fetch_url = request.validate()?;

        let source = match (&fetch_url, &request.content) {
            (Some(url), _) => {
                info!("Fetching {} for SEO analysis", url);
                self.fetcher.fetch(url).await?
            }
            (None, Some(content)) => content.clone(),
            (None, None) => return Err(ServiceError::missing_argument("url")),
        };

        let is_html = source.contains('<') && source.contains('>');
        let visible = if is_html {
            let without_head = match NON_CONTENT.as_ref() {
                Some(re) => re.replace_all(&source, " ").into_owned(),
                None => source.clone(),
            };
            strip_html(&without_head)
        } else {
            source.clone()
        };

        let analysis = self.analyzer.analyze(&visible, &request.keywords);
        let mut suggestions = analysis.suggestions;

        let on_page = is_html.then(|| OnPageReport::inspect(&source));
        if let Some(report) = &on_page {
            suggestions.extend(report.suggestions());
        }
        debug!(
            "SEO analysis scored {} with {} suggestions",
            analysis.seo_score,
            suggestions.len()
        );

        Ok(SeoAnalysis {
            url: request.url.clone(),
            seo_score: analysis.seo_score,
            suggestions,
            word_count: analysis.word_count,
            keyword_density: analysis.keyword_density,
            readability_score: analysis.readability_score,
            on_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticPage {
        html: String,
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch(&self, _url: &Url) -> ServiceResult<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.html.clone())
        }
    }

    fn service(html: &str) -> (SeoService, Arc<StaticPage>) {
        let page = Arc::new(StaticPage {
            html: html.to_string(),
            fetches: AtomicUsize::new(0),
        });
        (SeoService::new(page.clone()), page)
    }

    #[test]
    fn test_request_needs_content_or_url() {
        let empty = SeoRequest {
            url: None,
            content: Some("  ".to_string()),
            keywords: vec![],
        };
        assert!(
            empty
                .validate()
                .unwrap_err()
                .to_string()
                .contains("Missing required argument: url")
        );

        let bad_scheme = SeoRequest {
            url: Some("ftp://example.com".to_string()),
            content: None,
            keywords: vec![],
        };
        assert!(bad_scheme.validate().is_err());
    }

    #[tokio::test]
    async fn test_supplied_content_skips_fetch() {
        let (service, page) = service("<html></html>");
        let result = service
            .analyze(SeoRequest {
                url: Some("https://example.com".to_string()),
                content: Some("Plain words about rust. More words.".to_string()),
                keywords: vec!["rust".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(page.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(result.word_count, 6);
        assert!(result.on_page.is_none());
    }

    #[tokio::test]
    async fn test_fetched_page_gets_on_page_checks() {
        let html = r#"<html><head><title>Rust</title><style>body{}</style></head>
            <body><h1>Rust</h1><h1>Again</h1><p>Rust is fast.</p></body></html>"#;
        let (service, page) = service(html);

        let result = service
            .analyze(SeoRequest {
                url: Some("https://example.com/rust".to_string()),
                content: None,
                keywords: vec!["rust".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(page.fetches.load(Ordering::SeqCst), 1);
        let report = result.on_page.unwrap();
        assert_eq!(report.title.as_deref(), Some("Rust"));
        assert!(!report.has_meta_description);
        assert_eq!(report.h1_count, 2);
        // Head content is not counted as visible words
        assert_eq!(result.word_count, 5);
        assert!(result.suggestions.iter().any(|s| s.contains("Title is short")));
        assert!(result.suggestions.iter().any(|s| s == "Add a meta description."));
        assert!(result.suggestions.iter().any(|s| s.contains("found 2")));
    }

    #[test]
    fn test_on_page_report_detects_meta_description() {
        let html = r#"<head><title>A title that is comfortably long enough</title>
            <meta name="description" content="About"></head><h1 class="x">One</h1>"#;
        let report = OnPageReport::inspect(html);
        assert!(report.has_meta_description);
        assert_eq!(report.h1_count, 1);
        assert!(report.suggestions().is_empty());
    }
}
