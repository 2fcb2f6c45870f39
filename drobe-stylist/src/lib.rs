//! # Drobe Stylist Engine
//!
//! Outfit recommendation and assembly for the drobe closet app:
//! - Marketplace product search under strict rate and cost controls, with
//!   in-process and cross-session caching
//! - Garment compatibility scoring
//! - Outfit assembly around a seed item, AI planner first with a
//!   deterministic heuristic fallback
//!
//! This is a library-level subsystem consumed by UI code; it owns no CLI,
//! HTTP surface, or storage schema beyond its key-value namespace.

pub mod assembly;
pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod planner;
pub mod recommend;
pub mod services;
pub mod types;

pub use assembly::{AssemblyError, AssemblyOrchestrator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StylistConfig;
pub use models::{AssemblyOutcome, MarketplaceItem, Recommendation};
pub use recommend::RecommendationService;
pub use services::{MarketplaceClient, SearchError};
pub use types::{AssemblyContext, WardrobeProvider};
