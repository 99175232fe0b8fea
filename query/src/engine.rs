use crate::dsl::{NoteRequest, NoteValidationError};
use crate::explain::{explain, Explanation};
use crate::fusion::{fuse_weighted, FusionWeights, ScoredDisease};
use crate::matcher::{match_note, MatchPhase};
use clinigraph_core::audit::{AuditError, AuditEvent, AuditOperation, AuditOutcome, AuditSink, JsonlAuditSink};
use clinigraph_core::config::AppConfig;
use clinigraph_core::error::{ClinigraphError, ErrorCode};
use clinigraph_core::metrics::{MetricsCollector, MetricsSnapshot, PredictionOutcome};
use clinigraph_core::model::{ClinicalNote, Disease, Symptom};
use ingestion::bulk::BulkRow;
use ingestion::preprocess::preprocess_text;
use serde::{Deserialize, Serialize};
use slm::ner::{diseases_of, symptoms_of, EntityExtractor};
use slm::rules::KeywordExtractor;
use std::sync::Arc;
use std::time::Instant;
use storage::corpus::{Corpus, CorpusError};
use storage::index::{GraphBuilder, GraphView, KnowledgeGraph};
use storage::knowledge_base::{KnowledgeBase, KnowledgeBaseError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePrediction {
    pub symptoms: Vec<Symptom>,
    pub diseases: Vec<Disease>,
    pub phase: MatchPhase,
    pub graph: GraphView,
}

/// Result of a single-note prediction. `NoMatch` is an expected outcome,
/// not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NoteOutcome {
    Matched(NotePrediction),
    NoMatch,
}

impl NoteOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, NoteOutcome::Matched(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub note: ClinicalNote,
    pub graph_diseases: Vec<Disease>,
    pub ner_diseases: Vec<Disease>,
    pub ranking: Vec<ScoredDisease>,
    pub explanation: Explanation,
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid note: {0}")]
    InvalidNote(#[from] NoteValidationError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("knowledge base error: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
    #[error("entity extraction failed: {0}")]
    Extraction(String),
}

impl ClinigraphError for PredictionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            PredictionError::InvalidNote(_) | PredictionError::InvalidRequest(_) => {
                ErrorCode::InvalidArgument
            }
            PredictionError::Corpus(err) => err.error_code(),
            PredictionError::KnowledgeBase(err) => err.error_code(),
            PredictionError::Audit(_) | PredictionError::Extraction(_) => ErrorCode::Internal,
        }
    }
}

/// Owns the read-only knowledge base, graph and corpus, built once and
/// shared by every request.
pub struct PredictionEngine {
    knowledge_base: Arc<KnowledgeBase>,
    graph: Arc<KnowledgeGraph>,
    corpus: Arc<Corpus>,
    symptom_extractor: Box<dyn EntityExtractor>,
    disease_extractor: Box<dyn EntityExtractor>,
    weights: FusionWeights,
    top_k: usize,
    metrics: MetricsCollector,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

const DEFAULT_TOP_K: usize = 3;

impl PredictionEngine {
    pub fn new(knowledge_base: KnowledgeBase, corpus: Corpus) -> Self {
        let graph = GraphBuilder::from_knowledge_base(&knowledge_base);
        let symptom_extractor =
            KeywordExtractor::symptoms().with_keywords(knowledge_base.symptoms());

        Self {
            knowledge_base: Arc::new(knowledge_base),
            graph: Arc::new(graph),
            corpus: Arc::new(corpus),
            symptom_extractor: Box::new(symptom_extractor),
            disease_extractor: Box::new(KeywordExtractor::diseases()),
            weights: FusionWeights::default(),
            top_k: DEFAULT_TOP_K,
            metrics: MetricsCollector::default(),
            audit_sink: None,
        }
    }

    /// Loads corpus, knowledge base and audit sink as configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, PredictionError> {
        let knowledge_base = match &config.knowledge_base.path {
            Some(path) => KnowledgeBase::from_path(path)?,
            None => KnowledgeBase::builtin(),
        };
        let corpus = Corpus::from_path(&config.corpus.path)?;

        let mut engine = Self::new(knowledge_base, corpus)
            .with_weights(FusionWeights {
                graph: config.fusion.graph_weight,
                ner: config.fusion.ner_weight,
            })
            .with_top_k(config.fusion.top_k);
        engine.metrics = MetricsCollector::new(config.metrics.max_history);

        if let Some(path) = &config.audit.path {
            engine = engine.with_audit_sink(Arc::new(JsonlAuditSink::open(path)?));
        }
        Ok(engine)
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_extractors(
        mut self,
        symptom_extractor: Box<dyn EntityExtractor>,
        disease_extractor: Box<dyn EntityExtractor>,
    ) -> Self {
        self.symptom_extractor = symptom_extractor;
        self.disease_extractor = disease_extractor;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn predict_json(&self, raw: &str) -> Result<NoteOutcome, PredictionError> {
        let request = NoteRequest::parse_json(raw)
            .map_err(|err| PredictionError::InvalidRequest(err.to_string()))?;
        self.predict(&request)
    }

    /// Single-note flow: validate, match against the corpus, and build the
    /// note-level symptom/disease graph for the matched record.
    pub fn predict(&self, request: &NoteRequest) -> Result<NoteOutcome, PredictionError> {
        let start = Instant::now();
        let result = self.predict_internal(request);
        let (outcome, audit_outcome, diseases) = match &result {
            Ok(NoteOutcome::Matched(prediction)) => (
                PredictionOutcome::Matched,
                AuditOutcome::Matched,
                prediction.diseases.iter().map(|d| d.to_string()).collect(),
            ),
            Ok(NoteOutcome::NoMatch) => {
                (PredictionOutcome::NoMatch, AuditOutcome::NoMatch, Vec::new())
            }
            Err(err) if err.error_code().is_recoverable() => {
                (PredictionOutcome::Rejected, AuditOutcome::Rejected, Vec::new())
            }
            Err(_) => (PredictionOutcome::Failed, AuditOutcome::Failed, Vec::new()),
        };

        self.metrics.record(outcome, elapsed_us(start));
        let mut event = AuditEvent::new(AuditOperation::PredictNote, audit_outcome);
        event.note_chars = request.note.chars().count();
        event.diseases = diseases;
        event.error = result.as_ref().err().map(|err| err.to_string());
        self.emit_audit_event(event);
        result
    }

    fn predict_internal(&self, request: &NoteRequest) -> Result<NoteOutcome, PredictionError> {
        if let Err(err) = request.validate() {
            tracing::warn!(error = %err, "note rejected");
            return Err(err.into());
        }

        let Some(found) = match_note(&request.note, &self.corpus) else {
            tracing::info!("no close match found");
            return Ok(NoteOutcome::NoMatch);
        };

        let record = found.record;
        if record.symptoms.is_empty() || record.diseases.is_empty() {
            tracing::info!(
                position = found.position,
                "matched corpus record has no symptoms or diseases"
            );
            return Ok(NoteOutcome::NoMatch);
        }

        tracing::debug!(
            position = found.position,
            phase = ?found.phase,
            diseases = record.diseases.len(),
            "note matched"
        );
        let graph = GraphBuilder::build_from_symptoms(&record.symptoms, &record.diseases);
        Ok(NoteOutcome::Matched(NotePrediction {
            symptoms: record.symptoms.clone(),
            diseases: record.diseases.clone(),
            phase: found.phase,
            graph: graph.view(),
        }))
    }

    /// One output row per input note, in input order. Blank notes and
    /// unmatched notes become `not found` rows instead of failing the batch.
    pub fn predict_bulk<S: AsRef<str>>(&self, notes: &[S]) -> Vec<BulkRow> {
        let start = Instant::now();
        let rows: Vec<BulkRow> = notes
            .iter()
            .map(|note| {
                let note = note.as_ref();
                let note_start = Instant::now();
                let (outcome, row) = match self.predict_internal(&NoteRequest::new(note)) {
                    Ok(NoteOutcome::Matched(prediction)) => (
                        PredictionOutcome::Matched,
                        BulkRow::found(note, prediction.symptoms, prediction.diseases),
                    ),
                    Ok(NoteOutcome::NoMatch) => {
                        (PredictionOutcome::NoMatch, BulkRow::not_found(note))
                    }
                    Err(_) => (PredictionOutcome::Rejected, BulkRow::not_found(note)),
                };
                self.metrics.record(outcome, elapsed_us(note_start));
                row
            })
            .collect();

        let found = rows.iter().filter(|row| row.is_found()).count();
        tracing::info!(
            rows = rows.len(),
            found,
            elapsed_us = elapsed_us(start),
            "bulk prediction finished"
        );

        let outcome = if found > 0 {
            AuditOutcome::Matched
        } else {
            AuditOutcome::NoMatch
        };
        let mut event = AuditEvent::new(AuditOperation::PredictBulk, outcome);
        event.note_chars = notes.iter().map(|n| n.as_ref().chars().count()).sum();
        self.emit_audit_event(event);
        rows
    }

    /// Hybrid flow: rule-based symptom extraction, graph-derived and
    /// NER-derived diseases, weighted fusion, and an explanation.
    pub fn analyze(&self, request: &NoteRequest) -> Result<Analysis, PredictionError> {
        let start = Instant::now();
        let result = self.analyze_internal(request);
        let (outcome, audit_outcome) = match &result {
            Ok(analysis) if !analysis.ranking.is_empty() => {
                (PredictionOutcome::Matched, AuditOutcome::Matched)
            }
            Ok(_) => (PredictionOutcome::NoMatch, AuditOutcome::NoMatch),
            Err(err) if err.error_code().is_recoverable() => {
                (PredictionOutcome::Rejected, AuditOutcome::Rejected)
            }
            Err(_) => (PredictionOutcome::Failed, AuditOutcome::Failed),
        };
        self.metrics.record(outcome, elapsed_us(start));

        let mut event = AuditEvent::new(AuditOperation::Analyze, audit_outcome);
        event.note_chars = request.note.chars().count();
        if let Ok(analysis) = &result {
            event.diseases = analysis
                .explanation
                .top_diseases
                .iter()
                .map(|d| d.to_string())
                .collect();
        }
        event.error = result.as_ref().err().map(|err| err.to_string());
        self.emit_audit_event(event);
        result
    }

    fn analyze_internal(&self, request: &NoteRequest) -> Result<Analysis, PredictionError> {
        request.validate()?;

        let cleaned = preprocess_text(&request.note);
        let symptom_entities = self
            .symptom_extractor
            .extract(&cleaned)
            .map_err(|err| PredictionError::Extraction(err.to_string()))?;
        let symptoms = symptoms_of(&symptom_entities);

        let graph_diseases = self.graph.diseases_for_all(&symptoms);

        let disease_entities = self
            .disease_extractor
            .extract(&cleaned)
            .map_err(|err| PredictionError::Extraction(err.to_string()))?;
        let ner_diseases = diseases_of(&disease_entities);

        let ranking = fuse_weighted(&graph_diseases, &ner_diseases, self.weights);
        let explanation = explain(&request.note, &symptoms, &ranking, &self.graph, self.top_k);

        tracing::debug!(
            symptoms = symptoms.len(),
            graph_diseases = graph_diseases.len(),
            ner_diseases = ner_diseases.len(),
            "note analyzed"
        );

        let mut note = ClinicalNote::new(request.note.clone());
        note.symptoms = symptoms;
        note.diseases = ranking.iter().map(|s| s.disease.clone()).collect();
        note.ranked = ranking
            .iter()
            .map(|s| (s.disease.clone(), s.score))
            .collect();

        Ok(Analysis {
            note,
            graph_diseases,
            ner_diseases,
            ranking,
            explanation,
        })
    }

    fn emit_audit_event(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit_sink {
            if let Err(err) = sink.record(event) {
                tracing::warn!(error = %err, "failed to record audit event");
            }
        }
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
