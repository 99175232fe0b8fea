use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical form used for every label comparison: trimmed and lowercased.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

macro_rules! label_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Returns `None` when the label is blank after trimming.
            pub fn new(raw: &str) -> Option<Self> {
                let label = canonicalize(raw);
                if label.is_empty() {
                    None
                } else {
                    Some(Self(label))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

label_type!(
    /// A clinical symptom label, e.g. `chest pain`.
    Symptom
);

label_type!(
    /// A disease label, e.g. `angina`.
    Disease
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Symptom,
    Disease,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Symptom => f.write_str("symptom"),
            NodeKind::Disease => f.write_str("disease"),
        }
    }
}

/// Splits a comma-separated field into canonical symptoms, first occurrence kept.
/// Blank tokens are dropped so a trailing comma never yields an empty label.
pub fn parse_symptoms(field: &str) -> Vec<Symptom> {
    dedup_preserving_order(field.split(',').filter_map(Symptom::new))
}

pub fn parse_diseases(field: &str) -> Vec<Disease> {
    dedup_preserving_order(field.split(',').filter_map(Disease::new))
}

/// Inverse of [`parse_symptoms`] / [`parse_diseases`] for labels that carry no commas.
pub fn join_labels<T: AsRef<str>>(labels: &[T]) -> String {
    labels
        .iter()
        .map(|label| label.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// A note submitted for prediction, plus whatever the pipeline derived from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub text: String,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub diseases: Vec<Disease>,
    #[serde(default)]
    pub ranked: Vec<(Disease, f32)>,
}

impl ClinicalNote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}
