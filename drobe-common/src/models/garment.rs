//! Garment descriptor and style profile types

use super::OutfitSlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Category-agnostic garment attributes, shared by wardrobe items and
/// marketplace results.
///
/// Owned by the wardrobe collaborator; the recommendation engine treats
/// descriptors as immutable. Attribute strings may be empty — scoring
/// only considers attributes populated on both sides of a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentDescriptor {
    /// Stable item identifier
    pub id: Uuid,

    /// Item title (e.g. "blue cotton shirt")
    pub title: String,

    /// Longer free-text description
    pub description: String,

    /// Free-text color (compound names like "navy blue" are common)
    pub color: String,

    /// Free-text material (e.g. "cotton", "denim")
    pub material: String,

    /// Free-text style (e.g. "casual", "formal")
    pub style: String,

    /// Free-text fit (e.g. "slim", "relaxed")
    pub fit: String,

    /// Outfit slot this garment belongs to, when known
    pub category: Option<OutfitSlot>,

    /// Free-form tags
    pub tags: BTreeSet<String>,
}

impl GarmentDescriptor {
    /// Create a descriptor with the given title and empty attributes.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            color: String::new(),
            material: String::new(),
            style: String::new(),
            fit: String::new(),
            category: None,
            tags: BTreeSet::new(),
        }
    }
}

/// Optional style preferences supplied by the wardrobe collaborator,
/// forwarded verbatim to the outfit planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Preferred styles, most preferred first (e.g. ["minimalist", "casual"])
    #[serde(default)]
    pub preferred_styles: Vec<String>,

    /// Favorite colors
    #[serde(default)]
    pub favorite_colors: Vec<String>,

    /// Free-text notes from the user
    #[serde(default)]
    pub notes: Option<String>,
}
