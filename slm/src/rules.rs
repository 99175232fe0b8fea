use crate::ner::{Entity, EntityExtractor, EntityLabel};
use clinigraph_core::model::canonicalize;
use ingestion::preprocess::preprocess_text;

pub const SYMPTOM_KEYWORDS: [&str; 9] = [
    "chest pain",
    "shortness of breath",
    "fatigue",
    "nausea",
    "headache",
    "dizziness",
    "vomiting",
    "lack of appetite",
    "weakness",
];

/// Stand-in vocabulary for model-predicted diseases.
pub const DISEASE_KEYWORDS: [&str; 9] = [
    "angina",
    "heart attack",
    "copd",
    "asthma",
    "pneumonia",
    "depression",
    "hypothyroidism",
    "food poisoning",
    "migraine",
];

const SYMPTOM_CONFIDENCE: f32 = 0.9;
const DISEASE_CONFIDENCE: f32 = 0.8;

/// A vocabulary entry. `pattern` is the label as it reads after
/// [`preprocess_text`], so `covid-19` is still found in cleaned notes.
#[derive(Debug, Clone, PartialEq)]
struct Keyword {
    label: String,
    pattern: String,
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let label = canonicalize(raw);
        let pattern = preprocess_text(&label);
        if pattern.is_empty() {
            if !label.is_empty() {
                tracing::warn!(keyword = %label, "keyword has no letters and is ignored");
            }
            return None;
        }
        Some(Self { label, pattern })
    }

    /// Earliest match of the literal label or, failing that, its pattern.
    fn find_in(&self, folded: &str) -> Option<(usize, usize)> {
        folded
            .find(self.label.as_str())
            .map(|start| (start, start + self.label.len()))
            .or_else(|| {
                folded
                    .find(self.pattern.as_str())
                    .map(|start| (start, start + self.pattern.len()))
            })
    }
}

/// Case-insensitive substring extractor over a fixed vocabulary.
pub struct KeywordExtractor {
    keywords: Vec<Keyword>,
    label: EntityLabel,
    confidence: f32,
}

impl KeywordExtractor {
    pub fn new<I, K>(label: EntityLabel, keywords: I, confidence: f32) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            keywords: Vec::new(),
            label,
            confidence,
        }
        .with_keywords(keywords)
    }

    pub fn symptoms() -> Self {
        Self::new(EntityLabel::Symptom, SYMPTOM_KEYWORDS, SYMPTOM_CONFIDENCE)
    }

    pub fn diseases() -> Self {
        Self::new(EntityLabel::Disease, DISEASE_KEYWORDS, DISEASE_CONFIDENCE)
    }

    /// Adds vocabulary, e.g. every symptom known to the knowledge base.
    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for keyword in keywords.into_iter().filter_map(|k| Keyword::parse(k.as_ref())) {
            if !self.keywords.iter().any(|known| known.label == keyword.label) {
                self.keywords.push(keyword);
            }
        }
        self
    }

    /// Canonical labels in vocabulary order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.keywords.iter().map(|k| k.label.as_str())
    }
}

impl EntityExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        // ASCII folding keeps byte offsets aligned with `text`.
        let folded = text.to_ascii_lowercase();

        let mut entities: Vec<Entity> = self
            .keywords
            .iter()
            .filter_map(|keyword| {
                keyword.find_in(&folded).map(|span| Entity {
                    text: keyword.label.clone(),
                    label: self.label,
                    confidence: self.confidence,
                    span,
                })
            })
            .collect();

        entities.sort_by_key(|e| e.span.0);
        tracing::trace!(label = ?self.label, found = entities.len(), "keyword extraction");
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_extraction_reports_spans() {
        let extractor = KeywordExtractor::symptoms();
        let text = "Complaints of Fatigue, nausea and HEADACHE after new medication";
        let entities = extractor.extract(text).unwrap();

        let found: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(found, vec!["fatigue", "nausea", "headache"]);

        let headache = &entities[2];
        assert_eq!(&text[headache.span.0..headache.span.1], "HEADACHE");
        assert!(entities.iter().all(|e| e.label == EntityLabel::Symptom));
    }

    #[test]
    fn test_disease_extraction() {
        let extractor = KeywordExtractor::diseases();
        let entities = extractor
            .extract("History of COPD; rule out pneumonia")
            .unwrap();

        let found: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(found, vec!["copd", "pneumonia"]);
        assert!(entities.iter().all(|e| e.confidence == DISEASE_CONFIDENCE));
    }

    #[test]
    fn test_with_keywords_extends_vocabulary() {
        let extractor = KeywordExtractor::symptoms().with_keywords([" Fever", "fatigue"]);
        assert_eq!(extractor.keywords().count(), SYMPTOM_KEYWORDS.len() + 1);

        let entities = extractor.extract("high fever overnight").unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "fever");
    }

    #[test]
    fn test_punctuated_keywords_match_cleaned_text() {
        let extractor = KeywordExtractor::symptoms().with_keywords(["COVID-19", "type 2 diabetes", "42"]);
        assert_eq!(extractor.keywords().count(), SYMPTOM_KEYWORDS.len() + 2);

        let raw = extractor.extract("covid-19 positive").unwrap();
        assert_eq!(raw[0].text, "covid-19");
        assert_eq!(raw[0].span, (0, 8));

        let cleaned = extractor.extract("positive covid test known type diabetes").unwrap();
        let found: Vec<&str> = cleaned.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(found, vec!["covid-19", "type 2 diabetes"]);
        assert_eq!(cleaned[0].span, (9, 14));
    }

    #[test]
    fn test_no_entities_in_unrelated_text() {
        let extractor = KeywordExtractor::symptoms();
        assert!(extractor
            .extract("Patient stable no symptoms currently")
            .unwrap()
            .is_empty());
    }
}
