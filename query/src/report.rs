use crate::engine::Analysis;
use clinigraph_core::model::Disease;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregate view over a batch of hybrid analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub notes: usize,
    pub avg_predictions_per_note: f32,
    pub unique_graph_diseases: usize,
    pub unique_ner_diseases: usize,
    pub unique_fused_diseases: usize,
}

pub fn prediction_summary(analyses: &[Analysis]) -> PredictionSummary {
    let mut graph: BTreeSet<&Disease> = BTreeSet::new();
    let mut ner: BTreeSet<&Disease> = BTreeSet::new();
    let mut fused: BTreeSet<&Disease> = BTreeSet::new();
    let mut total_predictions = 0usize;

    for analysis in analyses {
        graph.extend(analysis.graph_diseases.iter());
        ner.extend(analysis.ner_diseases.iter());
        fused.extend(analysis.ranking.iter().map(|s| &s.disease));
        total_predictions += analysis.ranking.len();
    }

    let avg_predictions_per_note = if analyses.is_empty() {
        0.0
    } else {
        total_predictions as f32 / analyses.len() as f32
    };

    PredictionSummary {
        notes: analyses.len(),
        avg_predictions_per_note,
        unique_graph_diseases: graph.len(),
        unique_ner_diseases: ner.len(),
        unique_fused_diseases: fused.len(),
    }
}
