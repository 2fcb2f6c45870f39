//! # Drobe Common Library
//!
//! Shared code for the drobe closet application:
//! - Garment and outfit domain model
//! - Common error type
//! - Configuration file resolution and loading

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{GarmentDescriptor, Outfit, OutfitSlot, StyleProfile};
