//! Outfit assembly state machine
//!
//! One assembly run progresses through:
//! Idle → Planning → AiDelegated → (Resolved | Fallback) → Done
//!
//! Done is terminal; a new invocation starts a fresh session. The AI and
//! heuristic tiers are kept as distinct states so the fallback boundary is
//! testable in isolation.

use chrono::{DateTime, Utc};
use drobe_common::{Outfit, OutfitSlot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assembly workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssemblyState {
    /// Session created, seed not yet placed
    Idle,
    /// Seed placed, preparing the planner request
    Planning,
    /// Waiting on the AI planner
    AiDelegated,
    /// Planner result accepted, slots resolved by title
    Resolved,
    /// Planner unavailable or unusable; heuristic scoring fills slots
    Fallback,
    /// Assembly finished
    Done,
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: AssemblyState,
    pub new_state: AssemblyState,
    pub transitioned_at: DateTime<Utc>,
}

/// One outfit assembly run (in-memory state)
#[derive(Debug, Clone)]
pub struct AssemblySession {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Wardrobe item that triggered assembly; placed first, never displaced
    pub seed_item_id: Uuid,

    /// Current workflow state
    pub state: AssemblyState,

    /// Session start time
    pub started_at: DateTime<Utc>,

    /// Session end time (once Done)
    pub ended_at: Option<DateTime<Utc>>,
}

impl AssemblySession {
    pub fn new(seed_item_id: Uuid) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            seed_item_id,
            state: AssemblyState::Idle,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, producing the transition record
    pub fn transition_to(&mut self, new_state: AssemblyState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state == AssemblyState::Done {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    pub fn is_terminal(&self) -> bool {
        self.state == AssemblyState::Done
    }
}

/// Item the planner proposed that is not in the wardrobe.
///
/// `image_url` is filled by the optional image-generation post-step; a
/// suggestion survives without an image when generation fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedItem {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Option<OutfitSlot>,

    #[serde(default)]
    pub image_url: Option<String>,
}

/// Final assembly result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyOutcome {
    pub session_id: Uuid,

    /// The populated outfit (some slots possibly empty)
    pub outfit: Outfit,

    /// Human-readable explanation of the assembly
    pub reasoning: String,

    /// Filled slot count
    pub filled_slots: usize,

    /// Slots left empty
    pub empty_slots: Vec<OutfitSlot>,

    /// Whether the heuristic fallback produced the outfit
    pub used_fallback: bool,

    /// Planner-proposed items not present in the wardrobe
    pub suggested_items: Vec<SuggestedItem>,
}

/// Events broadcast during an assembly run (UI progress feed)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AssemblyEvent {
    /// Assembly started for a seed item
    Started {
        session_id: Uuid,
        seed_item_id: Uuid,
    },

    /// Workflow state changed
    StateChanged(StateTransition),

    /// A slot was filled
    SlotFilled {
        session_id: Uuid,
        slot: OutfitSlot,
        item_id: Uuid,
    },

    /// Assembly finished
    Completed {
        session_id: Uuid,
        filled_slots: usize,
        used_fallback: bool,
    },
}
