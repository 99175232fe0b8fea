use clinigraph_core::error::{ClinigraphError, ErrorCode};
use clinigraph_core::model::{parse_diseases, parse_symptoms, Disease, Symptom};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const NOTE_COLUMN: &str = "clinical_note";
pub const SYMPTOMS_COLUMN: &str = "extracted_symptoms";
pub const DISEASES_COLUMN: &str = "predicted_diseases";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to open corpus {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corpus is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("malformed corpus csv: {0}")]
    Csv(#[from] csv::Error),
}

impl ClinigraphError for CorpusError {
    fn error_code(&self) -> ErrorCode {
        match self {
            CorpusError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::NotFound
            }
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorpusRow {
    clinical_note: String,
    #[serde(default)]
    extracted_symptoms: String,
    #[serde(default)]
    predicted_diseases: String,
}

/// One prior note with the symptoms and diseases recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRecord {
    pub note: String,
    pub symptoms: Vec<Symptom>,
    pub diseases: Vec<Disease>,
    note_lower: String,
}

impl CorpusRecord {
    pub fn new(note: impl Into<String>, symptoms: Vec<Symptom>, diseases: Vec<Disease>) -> Self {
        let note = note.into();
        let note_lower = note.to_lowercase();
        Self {
            note,
            symptoms,
            diseases,
            note_lower,
        }
    }

    /// Builds a record from the comma-separated fields of a corpus row.
    pub fn from_fields(note: &str, symptoms: &str, diseases: &str) -> Self {
        Self::new(note, parse_symptoms(symptoms), parse_diseases(diseases))
    }

    pub fn note_lowercase(&self) -> &str {
        &self.note_lower
    }
}

/// Reference table the matcher scans, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<CorpusRecord>,
}

impl Corpus {
    pub fn new(records: Vec<CorpusRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorpusError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in [NOTE_COLUMN, SYMPTOMS_COLUMN, DISEASES_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(CorpusError::MissingColumn(column));
            }
        }

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<CorpusRow>() {
            let row = row?;
            records.push(CorpusRecord::from_fields(
                &row.clinical_note,
                &row.extracted_symptoms,
                &row.predicted_diseases,
            ));
        }
        Ok(Self { records })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), records = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    pub fn records(&self) -> &[CorpusRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorpusRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a CorpusRecord;
    type IntoIter = std::slice::Iter<'a, CorpusRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
