//! Canonical cache key builders.
//!
//! Keys are namespaced by result kind (`content:`, `seo:`, `keywords:`,
//! `translation:`, `image:`, `wp:`) so whole families can be invalidated with
//! [`CacheStore::delete_by_pattern`](super::CacheStore::delete_by_pattern).
//! Free-form inputs are folded into a stable name-based UUID.

use crate::error::ServiceResult;
use serde::Serialize;
use uuid::Uuid;

pub struct CacheKey;

impl CacheKey {
    /// Stable digest of arbitrary text.
    pub fn digest(input: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, input.as_bytes())
            .simple()
            .to_string()
    }

    /// Stable digest of a serializable value (field order as declared).
    ///
    /// Fails when the value cannot be serialized; two such values must never
    /// share a key.
    pub fn digest_value<T: Serialize>(value: &T) -> ServiceResult<String> {
        let canonical = serde_json::to_string(value)?;
        Ok(Self::digest(&canonical))
    }

    pub fn content<T: Serialize>(request: &T) -> ServiceResult<String> {
        Ok(format!("content:{}", Self::digest_value(request)?))
    }

    pub fn seo<T: Serialize>(request: &T) -> ServiceResult<String> {
        Ok(format!("seo:{}", Self::digest_value(request)?))
    }

    pub fn keywords<T: Serialize>(request: &T) -> ServiceResult<String> {
        Ok(format!("keywords:{}", Self::digest_value(request)?))
    }

    pub fn translation<T: Serialize>(
        source: &str,
        target: &str,
        request: &T,
    ) -> ServiceResult<String> {
        Ok(format!(
            "translation:{}:{}:{}",
            source,
            target,
            Self::digest_value(request)?
        ))
    }

    pub fn image<T: Serialize>(request: &T) -> ServiceResult<String> {
        Ok(format!("image:{}", Self::digest_value(request)?))
    }

    /// Prefix shared by every entry belonging to one WordPress site.
    pub fn wordpress_site(site_url: &str) -> String {
        format!("wp:{}:", Self::digest(normalize_site(site_url)))
    }

    pub fn wordpress_post(site_url: &str, post_id: u64) -> String {
        format!("{}post:{}", Self::wordpress_site(site_url), post_id)
    }

    /// Glob that matches every entry of one WordPress site.
    pub fn wordpress_site_pattern(site_url: &str) -> String {
        format!("{}*", Self::wordpress_site(site_url))
    }
}

fn normalize_site(site_url: &str) -> &str {
    site_url.trim().trim_end_matches('/')
}
