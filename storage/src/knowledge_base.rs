use clinigraph_core::error::{ClinigraphError, ErrorCode};
use clinigraph_core::model::{Disease, Symptom};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN: &[(&str, &[&str])] = &[
    ("chest pain", &["angina", "heart attack", "anxiety"]),
    ("shortness of breath", &["copd", "asthma", "pneumonia"]),
    ("fatigue", &["depression", "hypothyroidism", "anemia"]),
    ("nausea", &["food poisoning", "pregnancy", "migraine"]),
    ("headache", &["migraine", "tension headache", "hypertension"]),
    ("dizziness", &["vertigo", "low blood pressure", "anemia"]),
    ("vomiting", &["food poisoning", "migraine", "pregnancy"]),
    ("lack of appetite", &["depression", "infection", "cancer"]),
    ("weakness", &["stroke", "multiple sclerosis", "anemia"]),
    ("fever", &["flu", "malaria"]),
];

#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("knowledge base entry has a blank symptom")]
    BlankSymptom,
    #[error("symptom '{0}' maps to no diseases")]
    NoDiseases(String),
    #[error("failed to read knowledge base {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid knowledge base json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClinigraphError for KnowledgeBaseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            KnowledgeBaseError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorCode::NotFound
            }
            KnowledgeBaseError::BlankSymptom | KnowledgeBaseError::NoDiseases(_) => {
                ErrorCode::InvalidArgument
            }
            _ => ErrorCode::Internal,
        }
    }
}

/// Immutable symptom → diseases table. Lookups canonicalize their input.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<(Symptom, Vec<Disease>)>,
    index: HashMap<Symptom, usize>,
}

impl KnowledgeBase {
    pub fn builtin() -> Self {
        let entries = BUILTIN.iter().map(|(symptom, diseases)| {
            let diseases = diseases.iter().filter_map(|d| Disease::new(d)).collect();
            (Symptom::new(symptom), diseases)
        });

        let mut kb = Self::empty();
        for (symptom, diseases) in entries {
            if let Some(symptom) = symptom {
                kb.insert(symptom, diseases);
            }
        }
        kb
    }

    /// Repeated symptoms (after canonicalization) merge their disease lists.
    pub fn from_entries<I, S, L, D>(entries: I) -> Result<Self, KnowledgeBaseError>
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let mut kb = Self::empty();
        for (raw_symptom, raw_diseases) in entries {
            let symptom =
                Symptom::new(raw_symptom.as_ref()).ok_or(KnowledgeBaseError::BlankSymptom)?;
            let diseases: Vec<Disease> = raw_diseases
                .into_iter()
                .filter_map(|d| Disease::new(d.as_ref()))
                .collect();
            if diseases.is_empty() {
                return Err(KnowledgeBaseError::NoDiseases(symptom.into_string()));
            }
            kb.insert(symptom, diseases);
        }
        Ok(kb)
    }

    /// Parses `{"symptom": ["disease", ...], ...}`. Entries come back in key order.
    pub fn from_json_str(raw: &str) -> Result<Self, KnowledgeBaseError> {
        let table: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        Self::from_entries(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeBaseError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let kb = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), symptoms = kb.len(), "knowledge base loaded");
        Ok(kb)
    }

    /// Diseases mapped from `symptom`; empty for unknown symptoms.
    pub fn lookup(&self, symptom: &str) -> &[Disease] {
        Symptom::new(symptom)
            .and_then(|key| self.index.get(&key))
            .map(|idx| self.entries[*idx].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, symptom: &str) -> bool {
        !self.lookup(symptom).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symptom, &[Disease])> + '_ {
        self.entries
            .iter()
            .map(|(symptom, diseases)| (symptom, diseases.as_slice()))
    }

    pub fn symptoms(&self) -> impl Iterator<Item = &Symptom> + '_ {
        self.entries.iter().map(|(symptom, _)| symptom)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn insert(&mut self, symptom: Symptom, diseases: Vec<Disease>) {
        let idx = match self.index.get(&symptom) {
            Some(idx) => *idx,
            None => {
                self.index.insert(symptom.clone(), self.entries.len());
                self.entries.push((symptom, Vec::new()));
                self.entries.len() - 1
            }
        };
        let list = &mut self.entries[idx].1;
        for disease in diseases {
            if !list.contains(&disease) {
                list.push(disease);
            }
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
