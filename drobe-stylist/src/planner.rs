//! AI outfit planner boundary
//!
//! The planner is an opaque text-generation service: it receives the full
//! wardrobe plus context and replies with text that should contain a JSON
//! object. The engine owns the defensive parsing — models wrap JSON in
//! code fences or prose, and any response whose outfit object cannot be
//! recovered is a planner failure (the orchestrator then falls back to
//! heuristic scoring). A partially well-formed response is best-effort
//! success: missing reasoning/confidence/suggestions default to empty.

use crate::models::SuggestedItem;
use crate::types::AssemblyContext;
use async_trait::async_trait;
use drobe_common::{GarmentDescriptor, StyleProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Planner invocation errors. Timeouts are owned by the transport
/// collaborator and surface here like any other unavailability.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Planner unavailable: {0}")]
    Unavailable(String),

    #[error("Planner timed out")]
    Timeout,
}

/// Everything the planner sees for one assembly run
#[derive(Debug, Clone, Serialize)]
pub struct PlannerRequest {
    pub wardrobe: Vec<GarmentDescriptor>,
    pub context: AssemblyContext,
    pub style_profile: Option<StyleProfile>,
}

/// The AI planner collaborator
#[async_trait]
pub trait OutfitPlanner: Send + Sync {
    /// Produce raw response text for the request. The engine parses it;
    /// implementations should not attempt to validate the model output.
    async fn plan(&self, request: &PlannerRequest) -> Result<String, PlannerError>;
}

/// Parsed planner response. `outfit` maps slot names to wardrobe item
/// titles (or null for slots the planner left open).
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerResponse {
    pub outfit: HashMap<String, Option<String>>,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default)]
    pub confidence: f32,

    #[serde(default, alias = "suggestedItems")]
    pub suggested_items: Vec<SuggestedItem>,
}

/// Tagged parse result — shape is never trusted before validation
#[derive(Debug)]
pub enum PlannerParse {
    Ok(PlannerResponse),
    Malformed(String),
}

/// Recover a `PlannerResponse` from raw model text.
///
/// Strips non-JSON wrapping (markdown fences, prose) by slicing from the
/// first `{` to the last `}`. Any parse failure, including a missing
/// `outfit` object, yields `Malformed` with the raw text preserved for
/// logging.
pub fn parse_planner_response(raw: &str) -> PlannerParse {
    let Some(candidate) = extract_json_object(raw) else {
        return PlannerParse::Malformed(raw.to_string());
    };

    match serde_json::from_str::<PlannerResponse>(candidate) {
        Ok(response) => PlannerParse::Ok(response),
        Err(e) => {
            tracing::debug!(error = %e, "Planner response failed to parse");
            PlannerParse::Malformed(raw.to_string())
        }
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
