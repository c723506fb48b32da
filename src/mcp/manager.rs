use crate::cache::{CacheKey, CacheStats, CacheStore};
use crate::clock::{Clock, system_clock};
use crate::config::{CacheConfig, Credentials, RateLimitConfig, ServiceConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::llm::{ProviderAvailability, ProviderRegistry};
use crate::mcp::tools::{RateCategory, Tool, ToolDefinition, catalogue, parse_arguments};
use crate::mcp::types::{ToolRequest, ToolResponse};
use crate::rate_limiter::RateLimiter;
use crate::services::{
    ContentRequest, ContentService, HttpPageFetcher, HttpWordPressApi, ImageGenerationRequest,
    ImageService, KeywordResearchRequest, KeywordService, PageFetcher, SeoRequest, SeoService,
    TranslationRequest, TranslationService, WordPressAction, WordPressApi, WordPressRequest,
    WordPressService,
};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Sub-services reported by [`ServiceManager::get_service_status`].
pub const SERVICE_NAMES: [&str; 8] = [
    "content",
    "seo",
    "image",
    "wordpress",
    "thai",
    "keyword",
    "cache",
    "rate_limiter",
];

/// Entry point for tool calls.
///
/// Owns the provider registry, the result cache and one rate limiter per
/// [`RateCategory`]. Every call goes through the same pipeline: initialization
/// check, tool lookup, rate limit, argument decoding, cache lookup and finally
/// the capability service. Any failure on the way becomes a failed
/// [`ToolResponse`]; nothing is retried.
pub struct ServiceManager {
    config: ServiceConfig,
    registry: Arc<ProviderRegistry>,
    page_fetcher: Option<Arc<dyn PageFetcher>>,
    wordpress_api: Option<Arc<dyn WordPressApi>>,
    clock: Arc<dyn Clock>,
    services: RwLock<Option<Arc<Services>>>,
    sweepers: Mutex<Vec<JoinHandle<()>>>,
}

struct Services {
    content: ContentService,
    seo: SeoService,
    image: ImageService,
    translation: TranslationService,
    keywords: KeywordService,
    wordpress: WordPressService,
    cache: Option<Arc<CacheStore<Value>>>,
    cache_config: CacheConfig,
    limiters: Option<Arc<RateLimiters>>,
}

struct RateLimiters {
    config: RateLimitConfig,
    by_category: BTreeMap<RateCategory, RateLimiter>,
}

impl ServiceManager {
    pub fn new(config: ServiceConfig, registry: ProviderRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            page_fetcher: None,
            wordpress_api: None,
            clock: system_clock(),
            services: RwLock::new(None),
            sweepers: Mutex::new(Vec::new()),
        }
    }

    /// Builds adapters for every credential present in the environment.
    pub fn from_env(config: ServiceConfig) -> ServiceResult<Self> {
        let credentials = Credentials::from_env();
        let registry = ProviderRegistry::from_credentials(&credentials, &config)?;
        Ok(Self::new(config, registry))
    }

    pub fn with_page_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.page_fetcher = Some(fetcher);
        self
    }

    pub fn with_wordpress_api(mut self, api: Arc<dyn WordPressApi>) -> Self {
        self.wordpress_api = Some(api);
        self
    }

    /// Time source for cache expiry and rate-limit windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Creates the sub-services. Calling it again is a no-op.
    pub async fn initialize(&self) -> ServiceResult<()> {
        let mut slot = self.services.write().await;
        if slot.is_some() {
            debug!("Service manager already initialized");
            return Ok(());
        }

        info!("Initializing service manager");
        let availability = self.registry.availability();
        if !availability.has_any_text() {
            warn!("No text provider configured; content, translation and keyword tools will fail");
        }
        if !availability.has_any_image() {
            warn!("No image provider configured; image generation will fail");
        }

        let page_fetcher: Arc<dyn PageFetcher> = match &self.page_fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(HttpPageFetcher::new(self.config.http.text_timeout())?),
        };
        let wordpress_api: Arc<dyn WordPressApi> = match &self.wordpress_api {
            Some(api) => Arc::clone(api),
            None => Arc::new(HttpWordPressApi::new(self.config.http.wordpress_timeout())?),
        };

        let cache: Option<Arc<CacheStore<Value>>> = self
            .config
            .cache
            .enabled
            .then(|| Arc::new(CacheStore::with_clock(Arc::clone(&self.clock))));
        let limiters = self.config.rate_limits.enabled.then(|| {
            Arc::new(RateLimiters {
                config: self.config.rate_limits.clone(),
                by_category: RateCategory::ALL
                    .into_iter()
                    .map(|category| {
                        let limit = category.limit(&self.config.rate_limits);
                        (category, RateLimiter::with_clock(limit, Arc::clone(&self.clock)))
                    })
                    .collect(),
            })
        });

        let mut sweepers = self.sweepers.lock().await;
        for previous in sweepers.drain(..) {
            previous.abort();
        }
        let every = self.config.cache.sweep_interval();
        if let Some(cache) = &cache {
            sweepers.push(cache.spawn_sweeper(every));
        }
        if let Some(limiters) = &limiters {
            sweepers.push(limiters.spawn_pruner(every));
        }
        drop(sweepers);

        *slot = Some(Arc::new(Services {
            content: ContentService::new(Arc::clone(&self.registry)),
            seo: SeoService::new(page_fetcher),
            image: ImageService::new(Arc::clone(&self.registry)),
            translation: TranslationService::new(Arc::clone(&self.registry)),
            keywords: KeywordService::new(Arc::clone(&self.registry)),
            wordpress: WordPressService::new(wordpress_api),
            cache,
            cache_config: self.config.cache.clone(),
            limiters,
        }));

        info!(
            "Service manager initialized (cache: {}, rate limits: {})",
            self.config.cache.enabled, self.config.rate_limits.enabled
        );
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.services.read().await.is_some()
    }

    /// Runs one tool call. Always returns an envelope, whatever happens inside.
    pub async fn execute_tool(&self, request: ToolRequest) -> ToolResponse {
        let started = Instant::now();
        let tool = request.tool.clone();

        let outcome = match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Tool {} panicked", tool);
                Err(ServiceError::Internal(format!("tool {} panicked", tool)))
            }
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok((result, cached)) => {
                info!(
                    tool = %tool,
                    duration_ms = elapsed.as_millis() as u64,
                    cached,
                    "Tool execution succeeded"
                );
                ToolResponse::success(tool, result, elapsed, cached)
            }
            Err(e) => {
                warn!(
                    tool = %tool,
                    duration_ms = elapsed.as_millis() as u64,
                    code = %e.code(),
                    "Tool execution failed: {}",
                    e
                );
                ToolResponse::failure(tool, &e, elapsed)
            }
        }
    }

    async fn dispatch(&self, request: ToolRequest) -> ServiceResult<(Value, bool)> {
        let services = self
            .services
            .read()
            .await
            .clone()
            .ok_or(ServiceError::NotInitialized)?;

        let (tool, alias) = Tool::parse(&request.tool)?;
        let mut arguments = request.arguments.clone();
        if let Some(alias) = alias {
            debug!("Resolved legacy tool {} to {}", alias.name(), tool);
            alias.apply_defaults(&mut arguments);
        }

        services.check_rate_limit(tool, &request.identifier()).await?;
        services.run(tool, &arguments).await
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        catalogue()
    }

    /// Presence of each sub-service; all false before `initialize`.
    pub async fn get_service_status(&self) -> BTreeMap<String, bool> {
        let services = self.services.read().await.clone();
        SERVICE_NAMES
            .iter()
            .map(|name| {
                let present = match (&services, *name) {
                    (None, _) => false,
                    (Some(s), "cache") => s.cache.is_some(),
                    (Some(s), "rate_limiter") => s.limiters.is_some(),
                    (Some(_), _) => true,
                };
                (name.to_string(), present)
            })
            .collect()
    }

    pub fn provider_availability(&self) -> ProviderAvailability {
        self.registry.availability()
    }

    pub async fn cache_stats(&self) -> Option<CacheStats> {
        let services = self.services.read().await.clone()?;
        services.cache.as_ref().map(|cache| cache.stats())
    }

    /// Requests left per category for `identifier` in its current window.
    pub async fn rate_limit_status(&self, identifier: &str) -> BTreeMap<String, u32> {
        let Some(services) = self.services.read().await.clone() else {
            return BTreeMap::new();
        };
        let Some(limiters) = &services.limiters else {
            return BTreeMap::new();
        };

        let mut status = BTreeMap::new();
        for (category, limiter) in &limiters.by_category {
            let remaining = limiter
                .remaining(identifier, limiters.config.window())
                .await;
            status.insert(category.as_str().to_string(), remaining);
        }
        status
    }

    /// Drops rate-limit counters whose window has elapsed.
    ///
    /// Runs periodically on the cache sweep interval; returns how many
    /// identifiers were forgotten.
    pub async fn prune_rate_limits(&self) -> usize {
        let Some(services) = self.services.read().await.clone() else {
            return 0;
        };
        match &services.limiters {
            Some(limiters) => limiters.prune().await,
            None => 0,
        }
    }

    pub async fn shutdown(&self) -> ServiceResult<()> {
        info!("Shutting down service manager...");

        for handle in self.sweepers.lock().await.drain(..) {
            handle.abort();
        }
        if let Some(services) = self.services.write().await.take()
            && let Some(cache) = &services.cache
        {
            cache.clear();
        }

        if let Err(e) = self.registry.shutdown().await {
            error!("Provider shutdown failed: {}", e);
            return Err(e.into());
        }

        info!("Service manager shutdown complete");
        Ok(())
    }
}

impl RateLimiters {
    async fn prune(&self) -> usize {
        let window = self.config.window();
        let mut removed = 0;
        for limiter in self.by_category.values() {
            removed += limiter.prune(window).await;
        }
        removed
    }

    fn spawn_pruner(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiters = Arc::clone(self);
        let every = every.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                limiters.prune().await;
            }
        })
    }
}

impl Services {
    async fn check_rate_limit(&self, tool: Tool, identifier: &str) -> ServiceResult<()> {
        let Some(limiters) = &self.limiters else {
            return Ok(());
        };
        let category = tool.rate_category();
        let Some(limiter) = limiters.by_category.get(&category) else {
            return Ok(());
        };

        let window = limiters.config.window();
        if limiter.check_and_increment(identifier, window).await {
            return Ok(());
        }

        warn!(
            "Rate limit hit for {} on {} ({} per {}s)",
            identifier,
            category.as_str(),
            limiter.limit(),
            window.as_secs()
        );
        Err(ServiceError::RateLimited(format!(
            "{} allows {} requests per {} seconds",
            category.as_str(),
            limiter.limit(),
            window.as_secs()
        )))
    }

    async fn run(&self, tool: Tool, arguments: &Map<String, Value>) -> ServiceResult<(Value, bool)> {
        match tool {
            Tool::GenerateContent => {
                let request: ContentRequest = parse_arguments(tool, arguments)?;
                let key = CacheKey::content(&request.cache_identity())?;
                self.cached(tool, key, || self.content.generate(request)).await
            }
            Tool::AnalyzeSeo => {
                let request: SeoRequest = parse_arguments(tool, arguments)?;
                let key = CacheKey::seo(&request)?;
                self.cached(tool, key, || self.seo.analyze(request)).await
            }
            Tool::GenerateImage => {
                let request: ImageGenerationRequest = parse_arguments(tool, arguments)?;
                let key = CacheKey::image(&request)?;
                self.cached(tool, key, || self.image.generate(request)).await
            }
            Tool::TranslateThai => {
                let request: TranslationRequest = parse_arguments(tool, arguments)?;
                let key = CacheKey::translation(
                    &request.source_language,
                    &request.target_language,
                    &request,
                )?;
                self.cached(tool, key, || self.translation.translate(request))
                    .await
            }
            Tool::ResearchKeywords => {
                let request: KeywordResearchRequest = parse_arguments(tool, arguments)?;
                let key = CacheKey::keywords(&request)?;
                self.cached(tool, key, || self.keywords.research(request)).await
            }
            Tool::WordPressSync => {
                let request: WordPressRequest = parse_arguments(tool, arguments)?;
                self.sync_wordpress(request).await
            }
        }
    }

    async fn cached<T, F, Fut>(
        &self,
        tool: Tool,
        key: String,
        compute: F,
    ) -> ServiceResult<(Value, bool)>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&key)
        {
            debug!("Cache hit for {} ({})", tool, key);
            return Ok((hit, true));
        }

        let value = serde_json::to_value(compute().await?)?;

        if let Some(cache) = &self.cache
            && let Some(ttl) = tool.cache_ttl(&self.cache_config)
        {
            cache.set(key, value.clone(), ttl);
        }
        Ok((value, false))
    }

    /// Writes never come from the cache; a successful one drops the site's
    /// cached entries and remembers the post that was written.
    async fn sync_wordpress(&self, request: WordPressRequest) -> ServiceResult<(Value, bool)> {
        let site = request.site_url.clone();
        let result = self.wordpress.sync(request).await?;
        let value = serde_json::to_value(&result)?;

        if let Some(cache) = &self.cache {
            let removed = cache.delete_by_pattern(&CacheKey::wordpress_site_pattern(&site));
            if removed > 0 {
                debug!("Invalidated {} cached entries for {}", removed, site);
            }
            if result.action != WordPressAction::Delete
                && let Some(post_id) = result.post_id
            {
                cache.set(
                    CacheKey::wordpress_post(&site, post_id),
                    value.clone(),
                    Duration::from_secs(self.cache_config.wordpress_post_ttl_secs),
                );
            }
        }
        Ok((value, false))
    }
}
