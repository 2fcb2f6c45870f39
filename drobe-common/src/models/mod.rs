//! Domain model shared across drobe crates

mod garment;
mod outfit;

pub use garment::{GarmentDescriptor, StyleProfile};
pub use outfit::{Outfit, OutfitSlot};
