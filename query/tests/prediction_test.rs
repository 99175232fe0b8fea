use std::io::Write;
use std::sync::Arc;

use clinigraph_core::audit::{AuditOperation, AuditOutcome, InMemoryAuditSink};
use clinigraph_core::config::AppConfig;
use clinigraph_core::error::{ClinigraphError, ErrorCode};
use query::{FusionWeights, MatchPhase, NoteOutcome, NoteRequest, PredictionEngine};
use storage::corpus::Corpus;
use storage::knowledge_base::KnowledgeBase;
use tempfile::{tempdir, NamedTempFile};

const CORPUS_CSV: &str = "\
clinical_note,extracted_symptoms,predicted_diseases
Patient complains of chest pain and shortness of breath during exercise,\"chest pain, shortness of breath\",\"angina, heart attack, copd\"
Reports persistent fatigue and lack of appetite for two weeks,\"fatigue, lack of appetite\",\"depression, hypothyroidism\"
Severe headache with nausea since morning,\"headache, nausea\",\"migraine, food poisoning\"
";

fn engine() -> PredictionEngine {
    let corpus = Corpus::from_reader(CORPUS_CSV.as_bytes()).unwrap();
    PredictionEngine::new(KnowledgeBase::builtin(), corpus)
}

fn labels<T: AsRef<str>>(items: &[T]) -> Vec<&str> {
    items.iter().map(|i| i.as_ref()).collect()
}

#[test]
fn matching_ignores_case_and_surrounding_whitespace() {
    let engine = engine();
    let outcome = engine
        .predict(&NoteRequest::new("   PERSISTENT FATIGUE and lack   "))
        .unwrap();

    let NoteOutcome::Matched(prediction) = outcome else {
        panic!("expected a match");
    };
    assert_eq!(prediction.phase, MatchPhase::Substring);
    assert_eq!(labels(&prediction.symptoms), vec!["fatigue", "lack of appetite"]);
    assert_eq!(labels(&prediction.diseases), vec!["depression", "hypothyroidism"]);
    // complete bipartite: 2 symptoms x 2 diseases
    assert_eq!(prediction.graph.edges.len(), 4);
    assert_eq!(prediction.graph.nodes.len(), 4);
}

#[test]
fn keyword_phase_matches_unseen_wording() {
    let engine = engine();
    let outcome = engine
        .predict(&NoteRequest::new("Woke up with a headache, no other findings"))
        .unwrap();

    let NoteOutcome::Matched(prediction) = outcome else {
        panic!("expected a match");
    };
    assert_eq!(prediction.phase, MatchPhase::Keyword);
    assert_eq!(labels(&prediction.diseases), vec!["migraine", "food poisoning"]);
}

#[test]
fn asymptomatic_note_is_no_match() {
    let engine = engine();
    let outcome = engine
        .predict(&NoteRequest::new("Patient stable, no symptoms currently"))
        .unwrap();
    assert_eq!(outcome, NoteOutcome::NoMatch);
}

#[test]
fn empty_note_is_invalid_argument() {
    let engine = engine();
    let err = engine.predict(&NoteRequest::new("")).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
    assert_eq!(err.to_string(), "invalid note: please enter a valid clinical note");
}

#[test]
fn bulk_preserves_order_and_row_count() {
    let engine = engine();
    let notes = vec![
        "severe headache with nausea".to_string(),
        "".to_string(),
        "Patient stable, no symptoms currently".to_string(),
        "chest pain".to_string(),
    ];

    let rows = engine.predict_bulk(&notes);
    assert_eq!(rows.len(), notes.len());
    for (row, note) in rows.iter().zip(&notes) {
        assert_eq!(&row.clinical_note, note);
    }
    let found: Vec<bool> = rows.iter().map(|r| r.is_found()).collect();
    assert_eq!(found, vec![true, false, false, true]);
}

#[test]
fn analyze_fuses_graph_and_ner_predictions() {
    let engine = engine();
    let analysis = engine
        .analyze(&NoteRequest::new(
            "Chest pain radiating to arm; history of angina. See https://example.org/ref",
        ))
        .unwrap();

    assert_eq!(labels(&analysis.note.symptoms), vec!["chest pain"]);
    assert_eq!(
        labels(&analysis.graph_diseases),
        vec!["angina", "heart attack", "anxiety"]
    );
    assert_eq!(labels(&analysis.ner_diseases), vec!["angina"]);

    let top = &analysis.ranking[0];
    assert_eq!(top.disease.as_str(), "angina");
    assert!((top.score - 1.0).abs() < 1e-6);
    assert!((analysis.ranking[1].score - 0.6).abs() < 1e-6);

    let explanation = &analysis.explanation;
    assert_eq!(explanation.highlights.len(), 1);
    assert_eq!(explanation.highlights[0].span, (0, 10));
    assert_eq!(explanation.paths.edges.len(), 3);
    assert_eq!(labels(&explanation.top_diseases), vec!["angina", "heart attack", "anxiety"]);
}

#[test]
fn analyze_without_known_symptoms_has_empty_ranking() {
    let engine = engine();
    let analysis = engine
        .analyze(&NoteRequest::new("Routine follow-up visit"))
        .unwrap();
    assert!(analysis.note.symptoms.is_empty());
    assert!(analysis.ranking.is_empty());
    assert!(analysis.explanation.paths.edges.is_empty());
}

#[test]
fn custom_weights_change_ranking() {
    let engine = engine()
        .with_weights(FusionWeights { graph: 0.1, ner: 0.9 })
        .with_top_k(1);
    let analysis = engine
        .analyze(&NoteRequest::new("shortness of breath, known asthma and pneumonia"))
        .unwrap();

    assert_eq!(analysis.ranking[0].disease.as_str(), "asthma");
    assert_eq!(labels(&analysis.explanation.top_diseases), vec!["asthma"]);
}

#[test]
fn metrics_and_audit_track_each_request() {
    let sink = Arc::new(InMemoryAuditSink::default());
    let engine = engine().with_audit_sink(sink.clone());

    engine.predict(&NoteRequest::new("chest pain")).unwrap();
    engine.predict(&NoteRequest::new("no symptoms")).unwrap();
    let _ = engine.predict(&NoteRequest::new("  "));
    engine.predict_bulk(&["fatigue"]);

    let snapshot = engine.metrics();
    assert_eq!(snapshot.total_notes, 4);
    assert_eq!(snapshot.matched, 2);
    assert_eq!(snapshot.no_match, 1);
    assert_eq!(snapshot.rejected, 1);

    let events = sink.events().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].operation, AuditOperation::PredictNote);
    assert_eq!(events[0].outcome, AuditOutcome::Matched);
    assert_eq!(events[0].note_chars, "chest pain".len());
    assert_eq!(events[1].outcome, AuditOutcome::NoMatch);
    assert_eq!(events[2].outcome, AuditOutcome::Rejected);
    assert!(events[2].error.is_some());
    assert_eq!(events[3].operation, AuditOperation::PredictBulk);
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
}

#[test]
fn engine_loads_from_config_files() {
    let dir = tempdir().unwrap();
    let corpus_path = dir.path().join("notes.csv");
    std::fs::write(&corpus_path, CORPUS_CSV).unwrap();

    let kb_path = dir.path().join("kb.json");
    std::fs::write(&kb_path, r#"{"Cough": ["Bronchitis", "Asthma"]}"#).unwrap();

    let audit_path = dir.path().join("audit/events.jsonl");

    let mut config = AppConfig::default();
    config.corpus.path = corpus_path;
    config.knowledge_base.path = Some(kb_path);
    config.audit.path = Some(audit_path.clone());

    let engine = PredictionEngine::from_config(&config).unwrap();
    assert_eq!(engine.corpus().len(), 3);
    assert_eq!(engine.knowledge_base().len(), 1);
    assert!(engine.graph().has_edge("cough", "bronchitis"));

    let analysis = engine.analyze(&NoteRequest::new("Dry cough at night")).unwrap();
    assert_eq!(labels(&analysis.graph_diseases), vec!["bronchitis", "asthma"]);

    let audit = std::fs::read_to_string(&audit_path).unwrap();
    assert_eq!(audit.lines().count(), 1);
    assert!(audit.contains("\"operation\":\"analyze\""));
}

#[test]
fn missing_corpus_file_is_not_found() {
    let dir = tempdir().unwrap();
    let mut config = AppConfig::default();
    config.corpus.path = dir.path().join("absent.csv");

    let err = PredictionEngine::from_config(&config).err().unwrap();
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[test]
fn config_file_overrides_fusion_weights() {
    let corpus = NamedTempFile::new().unwrap();
    std::fs::write(corpus.path(), CORPUS_CSV).unwrap();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[corpus]\npath = {:?}\n[fusion]\ngraph_weight = 0.3\nner_weight = 0.7\ntop_k = 2",
        corpus.path().display().to_string()
    )
    .unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    let engine = PredictionEngine::from_config(&config).unwrap();
    assert_eq!(engine.weights(), FusionWeights { graph: 0.3, ner: 0.7 });
}

#[test]
fn analyze_finds_knowledge_base_symptoms_with_digits_and_hyphens() {
    let kb = KnowledgeBase::from_json_str(
        r#"{"covid-19": ["covid"], "type 2 diabetes": ["diabetes"], "cough": ["bronchitis"]}"#,
    )
    .unwrap();
    let engine = PredictionEngine::new(kb, Corpus::default());

    let analysis = engine
        .analyze(&NoteRequest::new("Positive covid-19 test, known type 2 diabetes, cough"))
        .unwrap();

    assert_eq!(
        labels(&analysis.note.symptoms),
        vec!["covid-19", "type 2 diabetes", "cough"]
    );
    assert_eq!(
        labels(&analysis.graph_diseases),
        vec!["covid", "diabetes", "bronchitis"]
    );
    let highlighted: Vec<&str> = analysis
        .explanation
        .highlights
        .iter()
        .map(|h| h.symptom.as_str())
        .collect();
    assert_eq!(highlighted, vec!["covid-19", "type 2 diabetes", "cough"]);
}
