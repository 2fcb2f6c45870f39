//! Garment compatibility scorer
//!
//! Pure scoring of how well two garment descriptors go together (wardrobe
//! item vs wardrobe item, or wardrobe item vs marketplace item). Additive
//! model over independent factors; a factor participates only when both
//! sides have the attribute populated, so a sparse descriptor is never
//! penalized for what it doesn't say.
//!
//! # Factors
//! - Lexical overlap (title+description tokens, >3 chars): up to 40
//! - Category exact match: +30
//! - Color relation (bidirectional substring, tolerates compound names
//!   like "navy blue"): +20
//! - Tag overlap (reference tags found in candidate text): up to 10
//!
//! The sum is divided by the number of factors that had data on both sides,
//! scaled by 1.2 when more than one factor actually contributed, and capped
//! at 100. A pair with no comparable attributes scores a neutral 50 —
//! "cannot assess" ranks differently from "actively dissimilar" downstream.

use drobe_common::GarmentDescriptor;
use std::collections::BTreeSet;

/// Neutral score for pairs with no comparable attributes
pub const NEUTRAL_SCORE: f32 = 50.0;

const LEXICAL_WEIGHT: f32 = 40.0;
const CATEGORY_WEIGHT: f32 = 30.0;
const COLOR_WEIGHT: f32 = 20.0;
const TAG_WEIGHT: f32 = 10.0;
const CORROBORATION_BONUS: f32 = 1.2;
const MIN_TOKEN_LEN: usize = 3;

/// Score plus the explanation shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// 0–100 compatibility score
    pub score: f32,
    /// Short templated string naming the factors that fired
    pub reasoning: String,
}

/// Compute the compatibility score between a reference garment and a
/// candidate. Pure and synchronous; identical inputs always produce
/// identical output.
pub fn score(reference: &GarmentDescriptor, candidate: &GarmentDescriptor) -> ScoreBreakdown {
    let mut total = 0.0f32;
    let mut factors_with_data = 0u32;
    let mut factors_contributing = 0u32;
    let mut phrases: Vec<String> = Vec::new();

    // Factor 1: lexical overlap across title + description
    let ref_tokens = tokenize(&reference.title, &reference.description);
    let cand_tokens = tokenize(&candidate.title, &candidate.description);
    if !ref_tokens.is_empty() && !cand_tokens.is_empty() {
        factors_with_data += 1;
        let shared = ref_tokens.intersection(&cand_tokens).count();
        let ratio = shared as f32 / ref_tokens.len() as f32;
        if shared > 0 {
            factors_contributing += 1;
            total += LEXICAL_WEIGHT * ratio;
            phrases.push(lexical_phrase(ratio).to_string());
        }
    }

    // Factor 2: category exact match
    if let (Some(ref_cat), Some(cand_cat)) = (reference.category, candidate.category) {
        factors_with_data += 1;
        if ref_cat == cand_cat {
            factors_contributing += 1;
            total += CATEGORY_WEIGHT;
            phrases.push(format!("same category ({})", ref_cat));
        }
    }

    // Factor 3: color relation, bidirectional substring
    let ref_color = reference.color.trim().to_lowercase();
    let cand_color = candidate.color.trim().to_lowercase();
    if !ref_color.is_empty() && !cand_color.is_empty() {
        factors_with_data += 1;
        if ref_color.contains(&cand_color) || cand_color.contains(&ref_color) {
            factors_contributing += 1;
            total += COLOR_WEIGHT;
            phrases.push("matching color palette".to_string());
        }
    }

    // Factor 4: reference tags found in candidate text
    let cand_text = format!("{} {}", candidate.title, candidate.description).to_lowercase();
    if !reference.tags.is_empty() && !cand_text.trim().is_empty() {
        factors_with_data += 1;
        let matched = reference
            .tags
            .iter()
            .filter(|tag| cand_text.contains(&tag.to_lowercase()))
            .count();
        if matched > 0 {
            factors_contributing += 1;
            total += TAG_WEIGHT * matched as f32 / reference.tags.len() as f32;
            phrases.push("shared tags".to_string());
        }
    }

    if factors_with_data == 0 {
        return ScoreBreakdown {
            score: NEUTRAL_SCORE,
            reasoning: "not enough detail to compare".to_string(),
        };
    }

    let mut score = total / factors_with_data as f32;
    if factors_contributing > 1 {
        score *= CORROBORATION_BONUS;
    }
    let score = score.min(100.0);

    let reasoning = if phrases.is_empty() {
        "little in common".to_string()
    } else {
        phrases.join(", ")
    };

    ScoreBreakdown { score, reasoning }
}

/// Case-insensitive tokens longer than `MIN_TOKEN_LEN` characters
fn tokenize(title: &str, description: &str) -> BTreeSet<String> {
    format!("{} {}", title, description)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > MIN_TOKEN_LEN)
        .map(|token| token.to_string())
        .collect()
}

fn lexical_phrase(ratio: f32) -> &'static str {
    if ratio >= 0.6 {
        "excellent style match"
    } else if ratio >= 0.3 {
        "good style match"
    } else {
        "some shared style cues"
    }
}
