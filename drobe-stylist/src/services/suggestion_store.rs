//! Persistent suggestion store
//!
//! Cross-session cache of shopping recommendations, keyed per wardrobe item
//! and namespaced by a schema version. Bumping [`SCHEMA_VERSION`] invalidates
//! every prior entry by simple key mismatch — no migration; old-generation
//! keys are deleted opportunistically when encountered.
//!
//! Each item stores three co-located entries (recommendation batch, ISO
//! saved-at timestamp, optional preview image ref) that are validated
//! together: a batch with a missing or unparseable timestamp is a miss.
//! Batches that persisted broken image links (earlier cache generations
//! wrote placeholder URLs) are rejected on load and purged.
//!
//! Storage growth is bounded on the read path: every `load` for item X
//! trims the namespace to the newest `max_cached_items` entries besides X.

use crate::clock::Clock;
use crate::db::KeyValueStore;
use crate::models::Recommendation;
use chrono::{DateTime, Duration, Utc};
use drobe_common::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Storage schema generation; bump to invalidate all persisted batches
pub const SCHEMA_VERSION: u32 = 3;

/// Common root of every generation's namespace
const NAMESPACE_ROOT: &str = "sugg_v";

/// Image hosts that earlier generations persisted as stand-ins for real
/// product photos; a loaded batch referencing any of these is discarded
const PLACEHOLDER_DOMAINS: [&str; 4] = [
    "placeholder.com",
    "placehold.it",
    "dummyimage.com",
    "example.com",
];

pub struct SuggestionStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_cached_items: usize,
}

impl SuggestionStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
        max_cached_items: usize,
    ) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::seconds(ttl_secs as i64),
            max_cached_items,
        }
    }

    /// Load the persisted batch for `item_id`, if fresh and intact.
    ///
    /// Also performs the namespace housekeeping that keeps the store
    /// bounded: old-generation keys are purged and the entry count for
    /// other items is trimmed.
    pub async fn load(&self, item_id: Uuid) -> Result<Option<Vec<Recommendation>>> {
        self.purge_old_generations().await?;
        self.trim_other_items(item_id).await?;

        let Some(saved_at_raw) = self.store.get(&timestamp_key(item_id)).await? else {
            return Ok(None);
        };

        let Ok(saved_at) = DateTime::parse_from_rfc3339(&saved_at_raw) else {
            tracing::debug!(%item_id, "Unparseable suggestion timestamp, treating as miss");
            self.evict_stale(item_id).await?;
            return Ok(None);
        };

        let age = self.clock.now() - saved_at.with_timezone(&Utc);
        if age >= self.ttl {
            tracing::debug!(%item_id, age_secs = age.num_seconds(), "Suggestion batch expired");
            self.evict_stale(item_id).await?;
            return Ok(None);
        }

        let Some(batch_raw) = self.store.get(&batch_key(item_id)).await? else {
            return Ok(None);
        };

        let batch: Vec<Recommendation> = match serde_json::from_str(&batch_raw) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!(%item_id, error = %e, "Unparseable suggestion batch, treating as miss");
                self.evict_stale(item_id).await?;
                return Ok(None);
            }
        };

        if batch.iter().any(|rec| has_broken_image(&rec.item.image_url)) {
            tracing::warn!(%item_id, "Persisted batch references broken image links, discarding");
            self.evict_stale(item_id).await?;
            return Ok(None);
        }

        tracing::debug!(%item_id, results = batch.len(), "Suggestion store hit");
        Ok(Some(batch))
    }

    /// Persist a batch for `item_id`: recommendations, timestamp, and the
    /// optional preview image reference, written together.
    pub async fn save(
        &self,
        item_id: Uuid,
        recommendations: &[Recommendation],
        preview_ref: Option<&str>,
    ) -> Result<()> {
        let batch_json = serde_json::to_string(recommendations)?;
        self.store.put(&batch_key(item_id), &batch_json).await?;
        self.store
            .put(&timestamp_key(item_id), &self.clock.now().to_rfc3339())
            .await?;

        match preview_ref {
            Some(url) => self.store.put(&preview_key(item_id), url).await?,
            None => self.store.delete(&preview_key(item_id)).await?,
        }

        tracing::debug!(%item_id, results = recommendations.len(), "Suggestion batch persisted");
        Ok(())
    }

    /// Remove all three entries for `item_id`.
    pub async fn evict_stale(&self, item_id: Uuid) -> Result<()> {
        self.store.delete(&batch_key(item_id)).await?;
        self.store.delete(&timestamp_key(item_id)).await?;
        self.store.delete(&preview_key(item_id)).await?;
        Ok(())
    }

    /// Preview image reference persisted with the batch, if any.
    pub async fn preview(&self, item_id: Uuid) -> Result<Option<String>> {
        self.store.get(&preview_key(item_id)).await
    }

    /// Delete keys from earlier schema generations as they are encountered.
    async fn purge_old_generations(&self) -> Result<()> {
        let current = namespace_prefix();
        for key in self.store.keys_with_prefix(NAMESPACE_ROOT).await? {
            if !key.starts_with(&current) {
                tracing::debug!(key = %key, "Purging old-generation suggestion key");
                self.store.delete(&key).await?;
            }
        }
        Ok(())
    }

    /// Keep at most `max_cached_items` items other than `current` in the
    /// namespace, deleting the oldest excess.
    async fn trim_other_items(&self, current: Uuid) -> Result<()> {
        let mut other_items: Vec<Uuid> = Vec::new();
        for key in self.store.keys_with_prefix(&namespace_prefix()).await? {
            if let Some(item_id) = item_id_of_key(&key) {
                if item_id != current && !other_items.contains(&item_id) {
                    other_items.push(item_id);
                }
            }
        }

        if other_items.len() <= self.max_cached_items {
            return Ok(());
        }

        // Oldest first; items with no readable timestamp sort oldest
        let mut by_age: BTreeMap<(DateTime<Utc>, Uuid), Uuid> = BTreeMap::new();
        for item_id in other_items {
            let saved_at = match self.store.get(&timestamp_key(item_id)).await? {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
                None => DateTime::<Utc>::MIN_UTC,
            };
            by_age.insert((saved_at, item_id), item_id);
        }

        let excess = by_age.len() - self.max_cached_items;
        for item_id in by_age.into_values().take(excess) {
            tracing::debug!(%item_id, "Evicting suggestion entry beyond retention bound");
            self.evict_stale(item_id).await?;
        }

        Ok(())
    }
}

fn namespace_prefix() -> String {
    format!("{}{}:", NAMESPACE_ROOT, SCHEMA_VERSION)
}

fn batch_key(item_id: Uuid) -> String {
    format!("{}{}:batch", namespace_prefix(), item_id)
}

fn timestamp_key(item_id: Uuid) -> String {
    format!("{}{}:saved_at", namespace_prefix(), item_id)
}

fn preview_key(item_id: Uuid) -> String {
    format!("{}{}:preview", namespace_prefix(), item_id)
}

/// Parse the item id segment out of `sugg_v3:{uuid}:{kind}`
fn item_id_of_key(key: &str) -> Option<Uuid> {
    let rest = key.strip_prefix(&namespace_prefix())?;
    let (id_segment, _) = rest.split_once(':')?;
    Uuid::parse_str(id_segment).ok()
}

fn has_broken_image(image_url: &Option<String>) -> bool {
    match image_url {
        None => true,
        Some(url) if url.trim().is_empty() => true,
        Some(url) => {
            let lowered = url.to_lowercase();
            PLACEHOLDER_DOMAINS
                .iter()
                .any(|domain| lowered.contains(domain))
        }
    }
}
