use serde::{Deserialize, Serialize};
use storage::corpus::{Corpus, CorpusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// The note text occurs inside a corpus note.
    Substring,
    /// A recorded symptom of the corpus note occurs inside the note text.
    Keyword,
}

#[derive(Debug, Clone, Copy)]
pub struct CorpusMatch<'a> {
    pub record: &'a CorpusRecord,
    pub position: usize,
    pub phase: MatchPhase,
}

/// Finds the corpus record a note corresponds to.
///
/// Every record is tried for a substring hit before any record is tried for
/// a keyword hit; within a phase the earliest record wins. Blank notes never
/// match.
pub fn match_note<'a>(note_text: &str, corpus: &'a Corpus) -> Option<CorpusMatch<'a>> {
    let needle = note_text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some((position, record)) = corpus
        .iter()
        .enumerate()
        .find(|(_, record)| record.note_lowercase().contains(&needle))
    {
        return Some(CorpusMatch {
            record,
            position,
            phase: MatchPhase::Substring,
        });
    }

    let haystack = note_text.to_lowercase();
    corpus
        .iter()
        .enumerate()
        .find(|(_, record)| {
            record
                .symptoms
                .iter()
                .any(|symptom| haystack.contains(symptom.as_str()))
        })
        .map(|(position, record)| CorpusMatch {
            record,
            position,
            phase: MatchPhase::Keyword,
        })
}
