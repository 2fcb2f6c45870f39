//! Shopping recommendation flow
//!
//! Independent of outfit assembly: given one wardrobe item, produce scored
//! marketplace suggestions. The persistent suggestion store is consulted
//! first; a live search only happens on a store miss, and its results are
//! written through so the next session starts warm. Rate-limit denials
//! surface unchanged for the UI to display a retry hint.

use crate::clock::Clock;
use crate::config::StylistConfig;
use crate::db::KeyValueStore;
use crate::models::{MarketplaceItem, Recommendation};
use crate::services::compatibility;
use crate::services::marketplace::{MarketplaceClient, SearchError};
use crate::services::rate_limiter::RateLimiter;
use crate::services::suggestion_store::SuggestionStore;
use chrono::{DateTime, Utc};
use drobe_common::GarmentDescriptor;
use std::sync::Arc;

pub struct RecommendationService {
    client: MarketplaceClient,
    store: SuggestionStore,
    clock: Arc<dyn Clock>,
    max_recommendations: usize,
}

impl RecommendationService {
    /// Wire up the full flow: one shared rate limiter in front of the
    /// marketplace client, the suggestion store on the given persistent
    /// backend.
    pub fn new(
        config: &StylistConfig,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SearchError> {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.limits.max_calls_per_hour,
            config.limits.min_call_spacing_ms,
            clock.clone(),
        ));
        let client = MarketplaceClient::new(config, rate_limiter, clock.clone())?;
        let store = SuggestionStore::new(
            kv,
            clock.clone(),
            config.cache.suggestion_ttl_secs,
            config.cache.max_cached_items,
        );

        Ok(Self {
            client,
            store,
            clock,
            max_recommendations: config.cache.max_recommendations,
        })
    }

    /// Scored marketplace suggestions for one wardrobe item, freshest
    /// persisted batch first.
    pub async fn recommendations_for(
        &self,
        garment: &GarmentDescriptor,
    ) -> Result<Vec<Recommendation>, SearchError> {
        match self.store.load(garment.id).await {
            Ok(Some(batch)) => {
                tracing::debug!(item = %garment.title, "Serving persisted suggestion batch");
                return Ok(batch);
            }
            Ok(None) => {}
            Err(e) => {
                // Store trouble degrades to a live search, never to the user
                tracing::debug!(error = %e, "Suggestion store unavailable, continuing with live search");
            }
        }

        let query = build_query(garment);
        let items = self.client.search(&query, garment.category).await?;

        let recommendations =
            score_batch(garment, items, self.clock.now(), self.max_recommendations);

        let preview = recommendations
            .iter()
            .find_map(|rec| rec.item.image_url.clone());
        if let Err(e) = self
            .store
            .save(garment.id, &recommendations, preview.as_deref())
            .await
        {
            tracing::warn!(error = %e, item = %garment.title, "Failed to persist suggestion batch");
        }

        Ok(recommendations)
    }
}

/// Attach a compatibility score and reasoning to each marketplace item,
/// returning the batch sorted best-first and capped at `max_results`.
pub fn score_batch(
    garment: &GarmentDescriptor,
    items: Vec<MarketplaceItem>,
    generated_at: DateTime<Utc>,
    max_results: usize,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = items
        .into_iter()
        .map(|item| {
            let candidate = descriptor_of(&item);
            let breakdown = compatibility::score(garment, &candidate);
            Recommendation {
                wardrobe_item_id: garment.id,
                item,
                similarity_score: breakdown.score,
                reasoning: breakdown.reasoning,
                generated_at,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    recommendations.truncate(max_results);
    recommendations
}

/// Search query built from the item's populated attributes, most specific
/// first; falls back to the raw title for items with no attributes.
fn build_query(garment: &GarmentDescriptor) -> String {
    let mut parts: Vec<&str> = [
        garment.color.as_str(),
        garment.material.as_str(),
        garment.style.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.trim().is_empty())
    .collect();

    match garment.category {
        Some(slot) => parts.push(slot.as_str()),
        None if parts.is_empty() => parts.push(garment.title.as_str()),
        None => {}
    }

    parts.join(" ")
}

/// View a marketplace item as a garment descriptor for scoring
fn descriptor_of(item: &MarketplaceItem) -> GarmentDescriptor {
    let mut descriptor = GarmentDescriptor::new(item.title.clone());
    descriptor.description = item.features.join(" ");
    descriptor
}
