//! Engine services

pub mod compatibility;
pub mod marketplace;
pub mod rate_limiter;
pub mod response_cache;
pub mod suggestion_store;

pub use compatibility::{score, ScoreBreakdown};
pub use marketplace::{MarketplaceClient, SearchError};
pub use rate_limiter::{Acquisition, DenyReason, RateLimiter};
pub use response_cache::ResponseCache;
pub use suggestion_store::SuggestionStore;
