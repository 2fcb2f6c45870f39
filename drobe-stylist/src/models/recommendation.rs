//! Normalized marketplace items and scored recommendations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized external-search result.
///
/// Raw provider payloads are translated into this shape once, at the search
/// client boundary; everything downstream consumes only this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceItem {
    /// Provider item identifier
    pub id: String,

    /// Item title
    pub title: String,

    /// Product image, when the provider supplied one
    pub image_url: Option<String>,

    /// Price in `currency` units; 0.0 when the provider omitted it
    pub price: f64,

    /// ISO currency code (defaults to "USD")
    pub currency: String,

    /// Star rating, 0.0–5.0
    pub rating: f32,

    /// Number of reviews behind the rating
    pub review_count: u32,

    /// Canonical detail/affiliate URL
    pub detail_url: String,

    /// Free-text feature bullets
    pub features: Vec<String>,
}

/// One wardrobe item paired with one marketplace item and the compatibility
/// score between them.
///
/// Recommendations are immutable value objects; a fresh search produces an
/// entirely new batch, never an in-place update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Wardrobe item this recommendation was generated for
    pub wardrobe_item_id: Uuid,

    /// The suggested marketplace item
    pub item: MarketplaceItem,

    /// Compatibility score, 0–100
    pub similarity_score: f32,

    /// Human-readable explanation of the score
    pub reasoning: String,

    /// When this batch was generated
    pub generated_at: DateTime<Utc>,
}
