//! Two-source linear opinion pool over disease predictions.
//!
//! Scores are weighted presence indicators: they are not calibrated
//! probabilities and do not sum to one across diseases.

use clinigraph_core::model::Disease;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_GRAPH_WEIGHT: f32 = 0.6;
pub const DEFAULT_NER_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight of the first source (graph-derived predictions).
    pub graph: f32,
    /// Weight of the second source (NER-derived predictions).
    pub ner: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            graph: DEFAULT_GRAPH_WEIGHT,
            ner: DEFAULT_NER_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDisease {
    pub disease: Disease,
    pub score: f32,
}

/// [`fuse_weighted`] with the default 0.6 / 0.4 weights.
pub fn fuse(source_a: &[Disease], source_b: &[Disease]) -> Vec<ScoredDisease> {
    fuse_weighted(source_a, source_b, FusionWeights::default())
}

/// Unions both sources (first-seen order, `source_a` first) and scores each
/// disease by the weights of the sources that predicted it. Highest score
/// first; equal scores keep union order.
pub fn fuse_weighted(
    source_a: &[Disease],
    source_b: &[Disease],
    weights: FusionWeights,
) -> Vec<ScoredDisease> {
    let in_a: HashSet<&Disease> = source_a.iter().collect();
    let in_b: HashSet<&Disease> = source_b.iter().collect();

    let mut seen = HashSet::new();
    let mut scored: Vec<ScoredDisease> = source_a
        .iter()
        .chain(source_b.iter())
        .filter(|disease| seen.insert(*disease))
        .map(|disease| {
            let a = if in_a.contains(disease) { weights.graph } else { 0.0 };
            let b = if in_b.contains(disease) { weights.ner } else { 0.0 };
            ScoredDisease {
                disease: disease.clone(),
                score: a + b,
            }
        })
        .collect();

    scored.sort_by(|x, y| y.score.total_cmp(&x.score));
    scored
}
