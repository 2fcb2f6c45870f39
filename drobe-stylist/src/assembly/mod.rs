//! Outfit assembly orchestrator
//!
//! Top-level entry point: given a seed garment and a context, produce a
//! populated outfit. The seed is placed into its slot first and never
//! displaced. The AI planner gets the first attempt; when it is absent,
//! fails, times out, or returns unusable output, every still-empty slot is
//! filled by compatibility scoring against the seed. Planner failures are
//! never surfaced to the caller — the worst case is an outfit holding only
//! the seed item.
//!
//! One assembly may run per seed item at a time (single-flight): a second
//! request for a seed that is already Planning/AiDelegated is rejected with
//! `Busy`, not queued.

use crate::models::{
    AssemblyEvent, AssemblyOutcome, AssemblySession, AssemblyState, SuggestedItem,
};
use crate::planner::{parse_planner_response, OutfitPlanner, PlannerParse, PlannerRequest};
use crate::services::compatibility;
use crate::types::{AssemblyContext, ImageSynthesizer, WardrobeProvider};
use drobe_common::{GarmentDescriptor, Outfit, OutfitSlot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Bound on the random tie-break perturbation added to fallback scores.
/// Large enough to break exact ties, too small to reorder materially
/// different candidates.
const TIE_BREAK_JITTER: f32 = 1.0;

/// Capacity of the assembly event feed
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Orchestrator errors surfaced to the caller
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// An assembly for this seed item is already in flight
    #[error("Assembly already running for item: {0}")]
    Busy(String),
}

/// Outfit assembly orchestrator
pub struct AssemblyOrchestrator {
    wardrobe: Arc<dyn WardrobeProvider>,
    planner: Option<Arc<dyn OutfitPlanner>>,
    image_synthesizer: Option<Arc<dyn ImageSynthesizer>>,
    in_flight: Mutex<HashSet<Uuid>>,
    jitter_rng: Mutex<StdRng>,
    event_tx: broadcast::Sender<AssemblyEvent>,
}

impl AssemblyOrchestrator {
    pub fn new(
        wardrobe: Arc<dyn WardrobeProvider>,
        planner: Option<Arc<dyn OutfitPlanner>>,
        image_synthesizer: Option<Arc<dyn ImageSynthesizer>>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            wardrobe,
            planner,
            image_synthesizer,
            in_flight: Mutex::new(HashSet::new()),
            jitter_rng: Mutex::new(StdRng::from_entropy()),
            event_tx,
        }
    }

    /// Replace the tie-break RNG with a seeded one (deterministic tests).
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.jitter_rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Subscribe to the assembly progress feed.
    pub fn subscribe(&self) -> broadcast::Receiver<AssemblyEvent> {
        self.event_tx.subscribe()
    }

    /// Assemble an outfit around `seed`.
    pub async fn assemble(
        &self,
        seed: &GarmentDescriptor,
        context: &AssemblyContext,
    ) -> Result<AssemblyOutcome, AssemblyError> {
        // Single-flight per seed item
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if !in_flight.insert(seed.id) {
                tracing::debug!(seed = %seed.title, "Assembly already in flight, rejecting");
                return Err(AssemblyError::Busy(seed.title.clone()));
            }
        }

        let outcome = self.run(seed, context).await;
        self.in_flight.lock().unwrap().remove(&seed.id);
        Ok(outcome)
    }

    async fn run(&self, seed: &GarmentDescriptor, context: &AssemblyContext) -> AssemblyOutcome {
        let mut session = AssemblySession::new(seed.id);
        let _ = self.event_tx.send(AssemblyEvent::Started {
            session_id: session.session_id,
            seed_item_id: seed.id,
        });

        tracing::info!(
            session_id = %session.session_id,
            seed = %seed.title,
            occasion = %context.occasion,
            "Starting outfit assembly"
        );

        self.transition(&mut session, AssemblyState::Planning);

        let mut outfit = Outfit::new();
        let seed_slot = self.wardrobe.categorize(seed).or(seed.category);
        match seed_slot {
            Some(slot) => {
                outfit.assign(slot, seed.id);
                self.emit_slot_filled(&session, slot, seed.id);
            }
            None => {
                tracing::warn!(seed = %seed.title, "Seed item has no categorizable slot");
            }
        }

        let garments = self.wardrobe.garments();

        let planner_response = self.delegate_to_planner(&mut session, &garments, context).await;

        let mut reasoning;
        let mut suggested_items = Vec::new();
        let used_fallback = planner_response.is_none();

        match planner_response {
            Some(response) => {
                self.transition(&mut session, AssemblyState::Resolved);
                self.resolve_planner_slots(&session, &mut outfit, seed_slot, &garments, &response.outfit);
                reasoning = if response.reasoning.is_empty() {
                    "Styled by your AI stylist.".to_string()
                } else {
                    response.reasoning
                };
                suggested_items = response.suggested_items;
            }
            None => {
                self.transition(&mut session, AssemblyState::Fallback);
                self.fill_by_compatibility(&session, &mut outfit, seed, &garments);
                reasoning = format!("Matched from your closet for compatibility with {}.", seed.title);
            }
        }

        self.attach_suggestion_images(&mut suggested_items).await;

        self.transition(&mut session, AssemblyState::Done);

        let filled_slots = outfit.filled_count();
        let empty_slots = outfit.empty_slots();

        if used_fallback && filled_slots <= 1 {
            // Fallback found no candidates anywhere; the seed alone is
            // still returned, filled
            reasoning = "No compatible items found in your closet.".to_string();
        }

        let _ = self.event_tx.send(AssemblyEvent::Completed {
            session_id: session.session_id,
            filled_slots,
            used_fallback,
        });

        tracing::info!(
            session_id = %session.session_id,
            filled_slots,
            empty_slots = empty_slots.len(),
            used_fallback,
            "Outfit assembly complete"
        );

        AssemblyOutcome {
            session_id: session.session_id,
            outfit,
            reasoning,
            filled_slots,
            empty_slots,
            used_fallback,
            suggested_items,
        }
    }

    /// Invoke the planner and parse its output. `None` means "use the
    /// heuristic fallback" — planner absent, errored, or unusable text.
    async fn delegate_to_planner(
        &self,
        session: &mut AssemblySession,
        garments: &[GarmentDescriptor],
        context: &AssemblyContext,
    ) -> Option<crate::planner::PlannerResponse> {
        let planner = match &self.planner {
            Some(planner) => planner,
            None => {
                tracing::debug!("No planner configured, using heuristic assembly");
                return None;
            }
        };

        self.transition(session, AssemblyState::AiDelegated);

        let request = PlannerRequest {
            wardrobe: garments.to_vec(),
            context: context.clone(),
            style_profile: self.wardrobe.style_profile(),
        };

        let raw = match planner.plan(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Planner unavailable, falling back to heuristic");
                return None;
            }
        };

        match parse_planner_response(&raw) {
            PlannerParse::Ok(response) => Some(response),
            PlannerParse::Malformed(raw) => {
                tracing::warn!(
                    raw_len = raw.len(),
                    "Planner returned unusable output, falling back to heuristic"
                );
                None
            }
        }
    }

    /// Resolve planner by-title references against the wardrobe. Exact
    /// title match only; unresolved references leave the slot empty
    /// rather than guessing.
    fn resolve_planner_slots(
        &self,
        session: &AssemblySession,
        outfit: &mut Outfit,
        seed_slot: Option<OutfitSlot>,
        garments: &[GarmentDescriptor],
        planned: &std::collections::HashMap<String, Option<String>>,
    ) {
        for (slot_name, title) in planned {
            let Some(slot) = OutfitSlot::from_name(slot_name) else {
                tracing::debug!(slot = %slot_name, "Planner referenced unknown slot, skipping");
                continue;
            };
            if Some(slot) == seed_slot {
                continue; // seed is never displaced
            }
            let Some(title) = title else { continue };

            let resolved = garments
                .iter()
                .find(|g| &g.title == title && !outfit.contains_item(g.id));
            match resolved {
                Some(garment) => {
                    if outfit.assign(slot, garment.id) {
                        self.emit_slot_filled(session, slot, garment.id);
                    }
                }
                None => {
                    tracing::debug!(
                        slot = %slot,
                        title = %title,
                        "Planner referenced item not in wardrobe, slot left empty"
                    );
                }
            }
        }
    }

    /// Fill every empty slot with the best-scoring wardrobe candidate for
    /// that slot. Ties are broken by a small bounded perturbation added
    /// once per candidate, so repeat runs are approximately stable. Slots
    /// with zero candidates stay empty.
    fn fill_by_compatibility(
        &self,
        session: &AssemblySession,
        outfit: &mut Outfit,
        seed: &GarmentDescriptor,
        garments: &[GarmentDescriptor],
    ) {
        for slot in outfit.empty_slots() {
            let mut best: Option<(f32, &GarmentDescriptor)> = None;

            for candidate in garments {
                if candidate.id == seed.id || outfit.contains_item(candidate.id) {
                    continue;
                }
                if self.wardrobe.categorize(candidate) != Some(slot) {
                    continue;
                }

                let breakdown = compatibility::score(seed, candidate);
                let jitter: f32 = self.jitter_rng.lock().unwrap().gen_range(0.0..TIE_BREAK_JITTER);
                let adjusted = breakdown.score + jitter;

                if best.map_or(true, |(top, _)| adjusted > top) {
                    best = Some((adjusted, candidate));
                }
            }

            if let Some((adjusted, candidate)) = best {
                outfit.assign(slot, candidate.id);
                self.emit_slot_filled(session, slot, candidate.id);
                tracing::debug!(
                    slot = %slot,
                    candidate = %candidate.title,
                    score = adjusted,
                    "Filled slot by compatibility"
                );
            }
        }
    }

    /// Synthesize images for planner-suggested items. Failures are logged
    /// and the suggestion is kept without an image.
    async fn attach_suggestion_images(&self, suggestions: &mut [SuggestedItem]) {
        let Some(synthesizer) = &self.image_synthesizer else {
            return;
        };

        for suggestion in suggestions.iter_mut() {
            if suggestion.image_url.is_some() {
                continue;
            }

            let mut descriptor = GarmentDescriptor::new(suggestion.title.clone());
            descriptor.description = suggestion.description.clone();
            descriptor.category = suggestion.category;

            match synthesizer.render(&descriptor).await {
                Ok(image_ref) => suggestion.image_url = Some(image_ref),
                Err(e) => {
                    tracing::warn!(
                        suggestion = %suggestion.title,
                        error = %e,
                        "Image generation failed, keeping suggestion without image"
                    );
                }
            }
        }
    }

    fn transition(&self, session: &mut AssemblySession, state: AssemblyState) {
        let transition = session.transition_to(state);
        let _ = self.event_tx.send(AssemblyEvent::StateChanged(transition));
    }

    fn emit_slot_filled(&self, session: &AssemblySession, slot: OutfitSlot, item_id: Uuid) {
        let _ = self.event_tx.send(AssemblyEvent::SlotFilled {
            session_id: session.session_id,
            slot,
            item_id,
        });
    }
}
