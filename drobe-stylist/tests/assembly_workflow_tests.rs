//! Outfit assembly workflow tests
//!
//! Exercises the full orchestrator against stub collaborators: planner
//! resolution, heuristic fallback, single-flight rejection, and the
//! optional image-generation post-step.

use async_trait::async_trait;
use drobe_common::{GarmentDescriptor, OutfitSlot, StyleProfile};
use drobe_stylist::assembly::{AssemblyError, AssemblyOrchestrator};
use drobe_stylist::models::AssemblyEvent;
use drobe_stylist::planner::{OutfitPlanner, PlannerError, PlannerRequest};
use drobe_stylist::types::{AssemblyContext, ImageGenError, ImageSynthesizer, WardrobeProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

struct StubWardrobe {
    items: Vec<GarmentDescriptor>,
}

impl WardrobeProvider for StubWardrobe {
    fn garments(&self) -> Vec<GarmentDescriptor> {
        self.items.clone()
    }

    fn categorize(&self, garment: &GarmentDescriptor) -> Option<OutfitSlot> {
        garment.category
    }

    fn style_profile(&self) -> Option<StyleProfile> {
        None
    }
}

/// Planner that is always down
struct FailingPlanner;

#[async_trait]
impl OutfitPlanner for FailingPlanner {
    async fn plan(&self, _request: &PlannerRequest) -> Result<String, PlannerError> {
        Err(PlannerError::Unavailable("service offline".to_string()))
    }
}

/// Planner that replies with a fixed text
struct ScriptedPlanner {
    response: String,
}

#[async_trait]
impl OutfitPlanner for ScriptedPlanner {
    async fn plan(&self, _request: &PlannerRequest) -> Result<String, PlannerError> {
        Ok(self.response.clone())
    }
}

/// Planner that parks until released, then fails (long-running AI call)
struct BlockingPlanner {
    release: Arc<Notify>,
}

#[async_trait]
impl OutfitPlanner for BlockingPlanner {
    async fn plan(&self, _request: &PlannerRequest) -> Result<String, PlannerError> {
        self.release.notified().await;
        Err(PlannerError::Timeout)
    }
}

struct FailingImageGen;

#[async_trait]
impl ImageSynthesizer for FailingImageGen {
    async fn render(&self, _descriptor: &GarmentDescriptor) -> Result<String, ImageGenError> {
        Err(ImageGenError::Failed("render backend down".to_string()))
    }
}

struct StubImageGen;

#[async_trait]
impl ImageSynthesizer for StubImageGen {
    async fn render(&self, descriptor: &GarmentDescriptor) -> Result<String, ImageGenError> {
        Ok(format!("https://img.example/gen/{}.png", descriptor.title.replace(' ', "-")))
    }
}

fn garment(title: &str, slot: OutfitSlot, color: &str) -> GarmentDescriptor {
    let mut g = GarmentDescriptor::new(title);
    g.category = Some(slot);
    g.color = color.to_string();
    g
}

fn two_piece_wardrobe() -> (GarmentDescriptor, GarmentDescriptor) {
    let shirt = garment("blue cotton shirt", OutfitSlot::Top, "blue");
    let jeans = garment("dark denim jeans", OutfitSlot::Bottom, "dark blue");
    (shirt, jeans)
}

fn orchestrator(
    items: Vec<GarmentDescriptor>,
    planner: Option<Arc<dyn OutfitPlanner>>,
    image_gen: Option<Arc<dyn ImageSynthesizer>>,
) -> AssemblyOrchestrator {
    AssemblyOrchestrator::new(Arc::new(StubWardrobe { items }), planner, image_gen)
        .with_rng_seed(42)
}

#[tokio::test]
async fn test_planner_failure_falls_back_to_compatibility() {
    let (shirt, jeans) = two_piece_wardrobe();
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans.clone()],
        Some(Arc::new(FailingPlanner)),
        None,
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    assert!(outcome.used_fallback);
    assert_eq!(outcome.filled_slots, 2);
    assert_eq!(outcome.outfit.get(OutfitSlot::Top), Some(shirt.id));
    assert_eq!(outcome.outfit.get(OutfitSlot::Bottom), Some(jeans.id));
    for slot in [
        OutfitSlot::Shoes,
        OutfitSlot::Jacket,
        OutfitSlot::Hat,
        OutfitSlot::Accessories,
    ] {
        assert_eq!(outcome.outfit.get(slot), None, "{} should stay empty", slot);
    }
    assert_eq!(outcome.empty_slots.len(), 4);
}

#[tokio::test]
async fn test_planner_titles_resolved_exactly_and_seed_kept() {
    let (shirt, jeans) = two_piece_wardrobe();
    let response = r#"{
        "outfit": {
            "top": "some other shirt",
            "bottom": "dark denim jeans",
            "shoes": "white leather sneakers"
        },
        "reasoning": "relaxed weekend look",
        "confidence": 0.8
    }"#;
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans.clone()],
        Some(Arc::new(ScriptedPlanner {
            response: response.to_string(),
        })),
        None,
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    assert!(!outcome.used_fallback);
    // The seed keeps its slot even though the planner proposed a swap
    assert_eq!(outcome.outfit.get(OutfitSlot::Top), Some(shirt.id));
    assert_eq!(outcome.outfit.get(OutfitSlot::Bottom), Some(jeans.id));
    // "white leather sneakers" is not in the wardrobe: left empty, not guessed
    assert_eq!(outcome.outfit.get(OutfitSlot::Shoes), None);
    assert_eq!(outcome.reasoning, "relaxed weekend look");
}

#[tokio::test]
async fn test_malformed_planner_output_falls_back() {
    let (shirt, jeans) = two_piece_wardrobe();
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans.clone()],
        Some(Arc::new(ScriptedPlanner {
            response: "Sorry, I cannot produce an outfit today.".to_string(),
        })),
        None,
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    assert!(outcome.used_fallback);
    assert_eq!(outcome.outfit.get(OutfitSlot::Bottom), Some(jeans.id));
}

#[tokio::test]
async fn test_no_item_occupies_two_slots() {
    let (shirt, _) = two_piece_wardrobe();
    let wrap = garment("versatile wrap", OutfitSlot::Accessories, "cream");
    // Planner references the same item for two different slots
    let response = r#"{
        "outfit": {
            "hat": "versatile wrap",
            "accessories": "versatile wrap"
        }
    }"#;
    let orchestrator = orchestrator(
        vec![shirt.clone(), wrap.clone()],
        Some(Arc::new(ScriptedPlanner {
            response: response.to_string(),
        })),
        None,
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    let mut seen = HashSet::new();
    for (_, item_id) in outcome.outfit.iter() {
        assert!(seen.insert(item_id), "item {} occupies two slots", item_id);
    }
    // The wrap landed in exactly one of the two requested slots
    let placements = [OutfitSlot::Hat, OutfitSlot::Accessories]
        .iter()
        .filter(|slot| outcome.outfit.get(**slot) == Some(wrap.id))
        .count();
    assert_eq!(placements, 1);
}

#[tokio::test]
async fn test_concurrent_assembly_for_same_seed_is_busy() {
    let (shirt, jeans) = two_piece_wardrobe();
    let release = Arc::new(Notify::new());
    let orchestrator = Arc::new(orchestrator(
        vec![shirt.clone(), jeans.clone()],
        Some(Arc::new(BlockingPlanner {
            release: release.clone(),
        })),
        None,
    ));

    let first = {
        let orchestrator = orchestrator.clone();
        let shirt = shirt.clone();
        tokio::spawn(async move {
            orchestrator
                .assemble(&shirt, &AssemblyContext::default())
                .await
        })
    };

    // Let the first run reach the planner await
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let second = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await;
    assert!(matches!(second, Err(AssemblyError::Busy(_))));

    // First run completes (planner timeout degrades to fallback)
    release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(outcome.used_fallback);

    // The in-flight slot is released for a fresh invocation
    release.notify_one();
    let third = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await;
    assert!(third.is_ok());
}

#[tokio::test]
async fn test_suggestions_survive_image_generation_failure() {
    let (shirt, jeans) = two_piece_wardrobe();
    let response = r#"{
        "outfit": {},
        "suggestedItems": [{"title": "white canvas sneakers", "category": "shoes"}]
    }"#;
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans],
        Some(Arc::new(ScriptedPlanner {
            response: response.to_string(),
        })),
        Some(Arc::new(FailingImageGen)),
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    assert_eq!(outcome.suggested_items.len(), 1);
    assert_eq!(outcome.suggested_items[0].title, "white canvas sneakers");
    assert!(outcome.suggested_items[0].image_url.is_none());
}

#[tokio::test]
async fn test_suggestions_get_synthesized_images() {
    let (shirt, jeans) = two_piece_wardrobe();
    let response = r#"{
        "outfit": {},
        "suggestedItems": [{"title": "straw hat", "category": "hat"}]
    }"#;
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans],
        Some(Arc::new(ScriptedPlanner {
            response: response.to_string(),
        })),
        Some(Arc::new(StubImageGen)),
    );

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    assert_eq!(
        outcome.suggested_items[0].image_url.as_deref(),
        Some("https://img.example/gen/straw-hat.png")
    );
}

#[tokio::test]
async fn test_seed_alone_when_no_candidates_exist() {
    let (shirt, _) = two_piece_wardrobe();
    let orchestrator = orchestrator(vec![shirt.clone()], Some(Arc::new(FailingPlanner)), None);

    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    // Never a hard error: the seed item alone is returned, filled
    assert_eq!(outcome.filled_slots, 1);
    assert_eq!(outcome.outfit.get(OutfitSlot::Top), Some(shirt.id));
    assert_eq!(outcome.reasoning, "No compatible items found in your closet.");
}

#[tokio::test]
async fn test_assembly_emits_progress_events() {
    let (shirt, jeans) = two_piece_wardrobe();
    let orchestrator = orchestrator(
        vec![shirt.clone(), jeans],
        Some(Arc::new(FailingPlanner)),
        None,
    );

    let mut events = orchestrator.subscribe();
    let outcome = orchestrator
        .assemble(&shirt, &AssemblyContext::default())
        .await
        .unwrap();

    let mut saw_started = false;
    let mut saw_completed = false;
    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            AssemblyEvent::Started { seed_item_id, .. } => {
                assert_eq!(seed_item_id, shirt.id);
                saw_started = true;
            }
            AssemblyEvent::StateChanged(t) => transitions.push(t.new_state),
            AssemblyEvent::Completed {
                filled_slots,
                used_fallback,
                ..
            } => {
                assert_eq!(filled_slots, outcome.filled_slots);
                assert!(used_fallback);
                saw_completed = true;
            }
            AssemblyEvent::SlotFilled { .. } => {}
        }
    }

    assert!(saw_started);
    assert!(saw_completed);
    let names: Vec<String> = transitions.iter().map(|s| format!("{:?}", s)).collect();
    assert_eq!(names, ["Planning", "AiDelegated", "Fallback", "Done"]);
}
