pub mod dsl;
pub mod engine;
pub mod explain;
pub mod fusion;
pub mod matcher;
pub mod report;

pub use dsl::{NoteRequest, NoteValidationError};
pub use engine::{Analysis, NoteOutcome, NotePrediction, PredictionEngine, PredictionError};
pub use explain::{Explanation, Highlight};
pub use fusion::{fuse, fuse_weighted, FusionWeights, ScoredDisease};
pub use matcher::{match_note, CorpusMatch, MatchPhase};
pub use report::{prediction_summary, PredictionSummary};
