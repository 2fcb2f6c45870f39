//! Collaborator boundaries consumed by the engine
//!
//! The wardrobe, AI planner, and image generator are external collaborators;
//! the engine depends on them only through these seams so tests can
//! substitute deterministic implementations.

use async_trait::async_trait;
use drobe_common::{GarmentDescriptor, OutfitSlot, StyleProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context for one assembly run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyContext {
    #[serde(default)]
    pub occasion: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub weather: String,

    #[serde(default)]
    pub time_of_day: String,

    #[serde(default)]
    pub style_goal: String,
}

/// The wardrobe collaborator: supplies garments, their slot categorization,
/// and the optional style profile. The engine never mutates wardrobe items.
pub trait WardrobeProvider: Send + Sync {
    fn garments(&self) -> Vec<GarmentDescriptor>;

    fn categorize(&self, garment: &GarmentDescriptor) -> Option<OutfitSlot>;

    fn style_profile(&self) -> Option<StyleProfile>;
}

/// Image generation errors
#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("Image generation failed: {0}")]
    Failed(String),
}

/// Optional image-generation collaborator. Purely additive: a failure here
/// never aborts assembly; the suggestion is surfaced without an image.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Synthesize a representative image for a garment descriptor,
    /// returning an image reference (URL or asset id).
    async fn render(&self, descriptor: &GarmentDescriptor) -> Result<String, ImageGenError>;
}
