//! Marketplace product-search client
//!
//! Wraps the rate limiter and response cache around the external product
//! search provider. Raw provider payloads are translated here, once, into
//! [`MarketplaceItem`]; no other module sees the provider schema. Missing
//! fields default deterministically (price 0, rating 0, review count 0,
//! image absent, features empty).
//!
//! Call order on a cache miss: `try_acquire` → HTTP → `record_call` →
//! translate → cache write. A cache hit returns before the limiter is
//! consulted and consumes no budget. A denied acquisition returns
//! `RateLimited` immediately — never blocks, never queues.

use crate::clock::Clock;
use crate::config::StylistConfig;
use crate::models::MarketplaceItem;
use crate::services::rate_limiter::{Acquisition, RateLimiter};
use crate::services::response_cache::ResponseCache;
use chrono::Duration;
use drobe_common::OutfitSlot;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const USER_AGENT: &str = "drobe/0.1 (https://github.com/drobe-app/drobe)";

/// Provider taxonomy bucket used for categories without a mapping
const DEFAULT_PROVIDER_CATEGORY: &str = "fashion";

/// Slot → provider taxonomy id. Unmapped input falls through to
/// [`DEFAULT_PROVIDER_CATEGORY`], never an error.
static CATEGORY_TAXONOMY: Lazy<HashMap<OutfitSlot, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (OutfitSlot::Top, "fashion-tops"),
        (OutfitSlot::Bottom, "fashion-bottoms"),
        (OutfitSlot::Shoes, "shoes"),
        (OutfitSlot::Jacket, "fashion-outerwear"),
        (OutfitSlot::Hat, "fashion-hats"),
        (OutfitSlot::Accessories, "fashion-accessories"),
    ])
});

/// Marketplace client errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Rate limited, retry in {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),
}

/// Provider search payload (provider-specific shape, translated here only)
#[derive(Debug, Deserialize)]
struct ProviderSearchResponse {
    #[serde(default)]
    products: Vec<ProviderProduct>,
}

#[derive(Debug, Deserialize)]
struct ProviderDetailResponse {
    #[serde(default)]
    product: Option<ProviderProduct>,
}

/// One raw provider product. Everything is optional; prices and ratings
/// arrive as strings ("$39.99", "4.3") or numbers depending on endpoint.
#[derive(Debug, Deserialize)]
struct ProviderProduct {
    product_id: Option<String>,
    product_title: Option<String>,
    product_photo: Option<String>,
    product_price: Option<serde_json::Value>,
    currency: Option<String>,
    product_star_rating: Option<serde_json::Value>,
    product_num_ratings: Option<u32>,
    product_url: Option<String>,
    #[serde(default)]
    about_product: Vec<String>,
}

/// Marketplace API client
pub struct MarketplaceClient {
    http_client: reqwest::Client,
    base_url: String,
    affiliate_tag: Option<String>,
    rate_limiter: Arc<RateLimiter>,
    search_cache: ResponseCache<Vec<MarketplaceItem>>,
    details_cache: ResponseCache<MarketplaceItem>,
    search_ttl: Duration,
    details_ttl: Duration,
}

impl MarketplaceClient {
    pub fn new(
        config: &StylistConfig,
        rate_limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(
                config.marketplace.request_timeout_secs,
            ))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.marketplace.base_url.trim_end_matches('/').to_string(),
            affiliate_tag: config.marketplace.affiliate_tag.clone(),
            rate_limiter,
            search_cache: ResponseCache::new(clock.clone()),
            details_cache: ResponseCache::new(clock),
            search_ttl: Duration::seconds(config.cache.search_ttl_secs as i64),
            details_ttl: Duration::seconds(config.cache.details_ttl_secs as i64),
        })
    }

    /// Search the marketplace. A fresh call yields a fresh batch; results
    /// are cached under the normalized query + category fingerprint.
    pub async fn search(
        &self,
        query: &str,
        category: Option<OutfitSlot>,
    ) -> Result<Vec<MarketplaceItem>, SearchError> {
        let normalized = normalize_query(query);
        let cache_key = search_cache_key(&normalized, category);

        if let Some(hit) = self.search_cache.get(&cache_key) {
            tracing::debug!(key = %cache_key, results = hit.len(), "Search cache hit");
            return Ok(hit);
        }

        match self.rate_limiter.try_acquire() {
            Acquisition::Denied { retry_after_ms, .. } => {
                return Err(SearchError::RateLimited { retry_after_ms });
            }
            Acquisition::Allowed => {}
        }

        let url = format!("{}/search", self.base_url);
        let provider_category = provider_category(category);

        tracing::debug!(query = %normalized, category = provider_category, "Querying marketplace");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", normalized.as_str()),
                ("category", provider_category),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        // A response arrived, so the provider saw the call
        self.rate_limiter.record_call();

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        // Malformed payload is zero results, not a fault
        let items = match serde_json::from_str::<ProviderSearchResponse>(&body) {
            Ok(payload) => self.translate_batch(payload.products),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed search payload, treating as zero results");
                Vec::new()
            }
        };

        tracing::info!(query = %normalized, results = items.len(), "Marketplace search complete");

        self.search_cache.put(cache_key, items.clone(), self.search_ttl);
        Ok(items)
    }

    /// Look up a single item by provider id.
    pub async fn get_details(&self, item_id: &str) -> Result<MarketplaceItem, SearchError> {
        let cache_key = format!("details:{}", item_id);

        if let Some(hit) = self.details_cache.get(&cache_key) {
            tracing::debug!(item_id, "Details cache hit");
            return Ok(hit);
        }

        match self.rate_limiter.try_acquire() {
            Acquisition::Denied { retry_after_ms, .. } => {
                return Err(SearchError::RateLimited { retry_after_ms });
            }
            Acquisition::Allowed => {}
        }

        let url = format!("{}/product", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("product_id", item_id)])
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        self.rate_limiter.record_call();

        let status = response.status();
        if status == 404 {
            return Err(SearchError::NotFound(item_id.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api(status.as_u16(), error_text));
        }

        let payload: ProviderDetailResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let item = payload
            .product
            .and_then(|p| self.translate(p))
            .ok_or_else(|| SearchError::NotFound(item_id.to_string()))?;

        self.details_cache
            .put(cache_key, item.clone(), self.details_ttl);
        Ok(item)
    }

    fn translate_batch(&self, products: Vec<ProviderProduct>) -> Vec<MarketplaceItem> {
        products
            .into_iter()
            .filter_map(|p| self.translate(p))
            .collect()
    }

    /// Translate one raw product; products without an id are dropped.
    fn translate(&self, product: ProviderProduct) -> Option<MarketplaceItem> {
        let id = product.product_id.filter(|id| !id.is_empty())?;
        let detail_url = self.with_affiliate_tag(product.product_url.unwrap_or_default());

        Some(MarketplaceItem {
            id,
            title: product.product_title.unwrap_or_default(),
            image_url: product.product_photo.filter(|url| !url.is_empty()),
            price: product.product_price.map(parse_price).unwrap_or(0.0),
            currency: product.currency.unwrap_or_else(|| "USD".to_string()),
            rating: product
                .product_star_rating
                .map(parse_rating)
                .unwrap_or(0.0),
            review_count: product.product_num_ratings.unwrap_or(0),
            detail_url,
            features: product.about_product,
        })
    }

    fn with_affiliate_tag(&self, url: String) -> String {
        match (&self.affiliate_tag, url.is_empty()) {
            (Some(tag), false) => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{}{}tag={}", url, separator, tag)
            }
            _ => url,
        }
    }
}

/// Lowercased, whitespace-collapsed query used for cache fingerprints and
/// provider requests alike.
fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn search_cache_key(normalized_query: &str, category: Option<OutfitSlot>) -> String {
    format!(
        "search:{}:{}",
        normalized_query,
        category.map(|c| c.as_str()).unwrap_or("all")
    )
}

fn provider_category(category: Option<OutfitSlot>) -> &'static str {
    category
        .and_then(|slot| CATEGORY_TAXONOMY.get(&slot).copied())
        .unwrap_or(DEFAULT_PROVIDER_CATEGORY)
}

/// Parse provider prices: numbers pass through, strings like "$1,299.99"
/// are stripped to digits. Anything unparseable is 0.
fn parse_price(value: serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Parse provider star ratings, clamped to 0–5.
fn parse_rating(value: serde_json::Value) -> f32 {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    raw.clamp(0.0, 5.0)
}
