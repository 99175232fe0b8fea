//! CSV codec for bulk prediction requests and responses.

use clinigraph_core::error::{ClinigraphError, ErrorCode};
use clinigraph_core::model::{join_labels, parse_diseases, parse_symptoms, Disease, Symptom};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use storage::corpus::{DISEASES_COLUMN, NOTE_COLUMN, SYMPTOMS_COLUMN};
use thiserror::Error;

/// Cell value written when a note produced no prediction.
pub const NOT_FOUND: &str = "not found";

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("the CSV must have a column named `{0}`")]
    MissingColumn(&'static str),
    #[error("malformed bulk csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("bulk io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClinigraphError for BulkError {
    fn error_code(&self) -> ErrorCode {
        match self {
            BulkError::MissingColumn(_) => ErrorCode::InvalidArgument,
            BulkError::Csv(_) | BulkError::Io(_) => ErrorCode::Internal,
        }
    }
}

/// One output row; `None` marks a note that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRow {
    pub clinical_note: String,
    pub symptoms: Option<Vec<Symptom>>,
    pub diseases: Option<Vec<Disease>>,
}

impl BulkRow {
    pub fn not_found(clinical_note: impl Into<String>) -> Self {
        Self {
            clinical_note: clinical_note.into(),
            symptoms: None,
            diseases: None,
        }
    }

    pub fn found(
        clinical_note: impl Into<String>,
        symptoms: Vec<Symptom>,
        diseases: Vec<Disease>,
    ) -> Self {
        Self {
            clinical_note: clinical_note.into(),
            symptoms: Some(symptoms),
            diseases: Some(diseases),
        }
    }

    pub fn is_found(&self) -> bool {
        self.symptoms.is_some() && self.diseases.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    clinical_note: String,
    extracted_symptoms: String,
    predicted_diseases: String,
}

impl From<&BulkRow> for CsvRow {
    fn from(row: &BulkRow) -> Self {
        Self {
            clinical_note: row.clinical_note.clone(),
            extracted_symptoms: row
                .symptoms
                .as_deref()
                .map(join_labels)
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            predicted_diseases: row
                .diseases
                .as_deref()
                .map(join_labels)
                .unwrap_or_else(|| NOT_FOUND.to_string()),
        }
    }
}

impl From<CsvRow> for BulkRow {
    fn from(row: CsvRow) -> Self {
        let symptoms = (row.extracted_symptoms.trim() != NOT_FOUND)
            .then(|| parse_symptoms(&row.extracted_symptoms));
        let diseases = (row.predicted_diseases.trim() != NOT_FOUND)
            .then(|| parse_diseases(&row.predicted_diseases));
        Self {
            clinical_note: row.clinical_note,
            symptoms,
            diseases,
        }
    }
}

/// Returns the `clinical_note` column in row order. Other columns are ignored.
pub fn read_bulk_request<R: Read>(reader: R) -> Result<Vec<String>, BulkError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let note_idx = csv_reader
        .headers()?
        .iter()
        .position(|h| h == NOTE_COLUMN)
        .ok_or(BulkError::MissingColumn(NOTE_COLUMN))?;

    let mut notes = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        notes.push(record.get(note_idx).unwrap_or_default().to_string());
    }
    tracing::debug!(rows = notes.len(), "bulk request parsed");
    Ok(notes)
}

pub fn write_bulk_response<W: Write>(writer: W, rows: &[BulkRow]) -> Result<(), BulkError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record([NOTE_COLUMN, SYMPTOMS_COLUMN, DISEASES_COLUMN])?;
    for row in rows {
        csv_writer.serialize(CsvRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn read_bulk_response<R: Read>(reader: R) -> Result<Vec<BulkRow>, BulkError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in [NOTE_COLUMN, SYMPTOMS_COLUMN, DISEASES_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(BulkError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<CsvRow>() {
        rows.push(BulkRow::from(row?));
    }
    Ok(rows)
}
