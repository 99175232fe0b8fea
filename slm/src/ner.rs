use clinigraph_core::model::{dedup_preserving_order, Disease, Symptom};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Symptom,
    Disease,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub confidence: f32,
    /// Byte range of the first occurrence in the submitted text.
    pub span: (usize, usize),
}

/// Pulls labelled clinical entities out of free text.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> anyhow::Result<Vec<Entity>>;
}

pub fn symptoms_of(entities: &[Entity]) -> Vec<Symptom> {
    dedup_preserving_order(
        entities
            .iter()
            .filter(|e| e.label == EntityLabel::Symptom)
            .filter_map(|e| Symptom::new(&e.text)),
    )
}

pub fn diseases_of(entities: &[Entity]) -> Vec<Disease> {
    dedup_preserving_order(
        entities
            .iter()
            .filter(|e| e.label == EntityLabel::Disease)
            .filter_map(|e| Disease::new(&e.text)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(text: &str, label: EntityLabel) -> Entity {
        Entity {
            text: text.to_string(),
            label,
            confidence: 0.9,
            span: (0, text.len()),
        }
    }

    #[test]
    fn test_split_by_label() {
        let entities = vec![
            entity("Fever", EntityLabel::Symptom),
            entity("flu", EntityLabel::Disease),
            entity("fever", EntityLabel::Symptom),
        ];

        let symptoms = symptoms_of(&entities);
        assert_eq!(symptoms, vec![Symptom::new("fever").unwrap()]);
        assert_eq!(diseases_of(&entities), vec![Disease::new("flu").unwrap()]);
    }
}
