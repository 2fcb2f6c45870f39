//! Stylist engine configuration
//!
//! All limits and TTLs the engine enforces are configuration, not constants
//! buried in the components that apply them. Loaded from the shared drobe
//! config file (see `drobe_common::config` for the resolution order); a
//! missing file or missing section means compiled defaults.

use drobe_common::config::{load_toml, resolve_config_file};
use drobe_common::Result;
use serde::Deserialize;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StylistConfig {
    pub marketplace: MarketplaceConfig,
    pub limits: LimitsConfig,
    pub cache: CacheConfig,
}

/// `[marketplace]` — external product-search provider
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Provider API base URL
    pub base_url: String,

    /// Affiliate tag appended to detail URLs, when configured
    pub affiliate_tag: Option<String>,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stylemarket.example/v1".to_string(),
            affiliate_tag: None,
            request_timeout_secs: 30,
        }
    }
}

/// `[limits]` — external-call budget
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Hourly ceiling on external product-search calls
    pub max_calls_per_hour: u32,

    /// Minimum spacing between consecutive external calls
    pub min_call_spacing_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_calls_per_hour: 8640,
            min_call_spacing_ms: 1000,
        }
    }
}

/// `[cache]` — freshness windows and bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for search-result cache entries (seconds)
    pub search_ttl_secs: u64,

    /// TTL for single-item detail cache entries (seconds)
    pub details_ttl_secs: u64,

    /// TTL for persisted suggestion batches (seconds)
    pub suggestion_ttl_secs: u64,

    /// Persisted suggestion batches retained beyond the current item
    pub max_cached_items: usize,

    /// Recommendations returned (and persisted) per wardrobe item
    pub max_recommendations: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: 3600,
            details_ttl_secs: 86400,
            suggestion_ttl_secs: 86400,
            max_cached_items: 10,
            max_recommendations: 10,
        }
    }
}

impl StylistConfig {
    /// Load configuration from the resolved drobe config file, falling back
    /// to compiled defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = resolve_config_file(None);
        Ok(load_toml::<StylistConfig>(path)?.unwrap_or_default())
    }
}
