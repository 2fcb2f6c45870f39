//! Engine-local models

mod assembly_session;
mod cache_entry;
mod recommendation;

pub use assembly_session::{
    AssemblyEvent, AssemblyOutcome, AssemblySession, AssemblyState, StateTransition,
    SuggestedItem,
};
pub use cache_entry::CacheEntry;
pub use recommendation::{MarketplaceItem, Recommendation};
