use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteRequest {
    pub note: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    #[error("please enter a valid clinical note")]
    EmptyNote,
}

impl NoteRequest {
    pub fn new(note: impl Into<String>) -> Self {
        Self { note: note.into() }
    }

    pub fn parse_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.note.trim().is_empty() {
            return Err(NoteValidationError::EmptyNote);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_note_is_rejected() {
        assert_eq!(
            NoteRequest::new(" \n\t ").validate(),
            Err(NoteValidationError::EmptyNote)
        );
        assert!(NoteRequest::new("fever").validate().is_ok());
    }

    #[test]
    fn parse_json_reads_note_field() {
        let request = NoteRequest::parse_json(r#"{"note": "chest pain"}"#).unwrap();
        assert_eq!(request.note, "chest pain");
        assert!(NoteRequest::parse_json(r#"{"text": "chest pain"}"#).is_err());
    }
}
