//! Explainability for hybrid predictions: where each symptom sits in the
//! note, and which knowledge-graph paths lead to the predicted diseases.

use crate::fusion::ScoredDisease;
use clinigraph_core::model::{Disease, Symptom};
use serde::{Deserialize, Serialize};
use storage::index::{GraphView, KnowledgeGraph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub symptom: String,
    /// Byte range into the original note.
    pub span: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub highlights: Vec<Highlight>,
    pub paths: GraphView,
    pub top_diseases: Vec<Disease>,
}

/// First case-insensitive occurrence of each symptom, ordered by position.
/// Symptoms absent from the text are skipped.
pub fn highlight_spans(text: &str, symptoms: &[Symptom]) -> Vec<Highlight> {
    let folded = text.to_ascii_lowercase();
    let mut highlights: Vec<Highlight> = symptoms
        .iter()
        .filter_map(|symptom| {
            folded.find(symptom.as_str()).map(|start| Highlight {
                symptom: symptom.to_string(),
                span: (start, start + symptom.as_str().len()),
            })
        })
        .collect();
    highlights.sort_by_key(|h| h.span.0);
    highlights
}

pub fn explain(
    note_text: &str,
    symptoms: &[Symptom],
    ranked: &[ScoredDisease],
    graph: &KnowledgeGraph,
    top_k: usize,
) -> Explanation {
    let predicted: Vec<Disease> = ranked.iter().map(|s| s.disease.clone()).collect();
    let paths = graph.subgraph(symptoms, &predicted).view();

    Explanation {
        highlights: highlight_spans(note_text, symptoms),
        paths,
        top_diseases: predicted.into_iter().take(top_k).collect(),
    }
}

/// Wraps every highlighted span in `[...]`, for plain-text presenters.
pub fn mark_highlights(text: &str, highlights: &[Highlight]) -> String {
    let mut out = String::with_capacity(text.len() + highlights.len() * 2);
    let mut cursor = 0;
    for highlight in highlights {
        let (start, end) = highlight.span;
        if start < cursor || end > text.len() {
            continue;
        }
        let (Some(before), Some(inner)) = (text.get(cursor..start), text.get(start..end)) else {
            continue;
        };
        out.push_str(before);
        out.push('[');
        out.push_str(inner);
        out.push(']');
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}
