use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use clinigraph_core::config::AppConfig;
use clinigraph_core::model::join_labels;
use ingestion::bulk::{read_bulk_request, write_bulk_response};
use query::explain::mark_highlights;
use query::{prediction_summary, NoteOutcome, NoteRequest, PredictionEngine};

#[derive(Parser)]
#[command(name = "clinigraph")]
#[command(about = "Symptom/disease knowledge-graph predictions for clinical notes", long_about = None)]
struct Cli {
    /// Config file (defaults to config/default + CLINIGRAPH_* env vars)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus CSV, overriding the configured path
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a note against the corpus and show its symptom/disease graph
    Predict {
        /// Free-text clinical note
        note: String,
    },

    /// Rule-based extraction, graph and NER predictions, fused ranking
    Analyze {
        /// Free-text clinical notes
        #[arg(required = true)]
        notes: Vec<String>,
    },

    /// Predict every row of a CSV with a `clinical_note` column
    Bulk {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "disease_predictions.csv")]
        output: PathBuf,
    },

    /// Show the knowledge graph, or the neighbourhood of one symptom
    Graph {
        #[arg(short, long)]
        symptom: Option<String>,
    },

    /// Load everything and report corpus and graph sizes
    Stats,
}

fn main() -> Result<()> {
    clinigraph_core::init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };
    if let Some(corpus) = &cli.corpus {
        config.corpus.path = corpus.clone();
    }

    let engine = PredictionEngine::from_config(&config)
        .with_context(|| format!("failed to load corpus {}", config.corpus.path.display()))?;

    match cli.command {
        Commands::Predict { note } => {
            let outcome = engine.predict(&NoteRequest::new(note))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }
            match outcome {
                NoteOutcome::Matched(prediction) => {
                    println!("Extracted Symptoms: {}", join_labels(&prediction.symptoms));
                    println!("Predicted Diseases: {}", join_labels(&prediction.diseases));
                    println!("Knowledge Graph:");
                    for edge in &prediction.graph.edges {
                        println!("  {} -> {}", edge.symptom, edge.disease);
                    }
                }
                NoteOutcome::NoMatch => println!("No close match found."),
            }
        }
        Commands::Analyze { notes } => {
            let mut analyses = Vec::with_capacity(notes.len());
            for note in notes {
                analyses.push(engine.analyze(&NoteRequest::new(note))?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&analyses)?);
                return Ok(());
            }
            for analysis in &analyses {
                let explanation = &analysis.explanation;
                println!("Note: {}", mark_highlights(&analysis.note.text, &explanation.highlights));
                println!("  Symptoms: {}", join_labels(&analysis.note.symptoms));
                println!("  Graph:    {}", join_labels(&analysis.graph_diseases));
                println!("  NER:      {}", join_labels(&analysis.ner_diseases));
                for scored in &analysis.ranking {
                    println!("  {:<20} {:.2}", scored.disease, scored.score);
                }
                println!("  Top: {}", join_labels(&explanation.top_diseases));
            }
            if analyses.len() > 1 {
                let summary = prediction_summary(&analyses);
                println!(
                    "Average predictions per note: {:.2} (unique graph {}, NER {}, fused {})",
                    summary.avg_predictions_per_note,
                    summary.unique_graph_diseases,
                    summary.unique_ner_diseases,
                    summary.unique_fused_diseases
                );
            }
        }
        Commands::Bulk { input, output } => {
            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            let notes = read_bulk_request(file)?;
            let rows = engine.predict_bulk(&notes);

            let out = File::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            write_bulk_response(out, &rows)?;

            let found = rows.iter().filter(|row| row.is_found()).count();
            println!(
                "Wrote {} rows ({} matched) to {}",
                rows.len(),
                found,
                output.display()
            );
        }
        Commands::Graph { symptom } => {
            let graph = engine.graph();
            match symptom {
                Some(symptom) => {
                    let neighbors = graph.within_two_hops(&symptom);
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&neighbors)?);
                    } else if neighbors.is_empty() {
                        println!("'{}' is not in the knowledge graph", symptom);
                    } else {
                        for neighbor in neighbors {
                            println!("  hop {} {:?} {}", neighbor.hop, neighbor.kind, neighbor.label);
                        }
                    }
                }
                None if cli.json => println!("{}", serde_json::to_string_pretty(&graph.view())?),
                None => {
                    for (symptom, disease, _) in graph.edges() {
                        println!("{} -> {}", symptom, disease);
                    }
                }
            }
        }
        Commands::Stats => {
            let graph = engine.graph();
            println!("Corpus records:   {}", engine.corpus().len());
            println!("Known symptoms:   {}", engine.knowledge_base().len());
            println!("Graph nodes:      {}", graph.node_count());
            println!("Graph edges:      {}", graph.edge_count());
        }
    }

    tracing::debug!(metrics = ?engine.metrics(), "done");
    Ok(())
}
