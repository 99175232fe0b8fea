use crate::index::KnowledgeGraph;
use crate::knowledge_base::KnowledgeBase;
use clinigraph_core::model::{Disease, Symptom};

/// Weight given to every edge the builders create.
pub const DEFAULT_EDGE_WEIGHT: f32 = 1.0;

/// Two connectivity policies for turning labels into a [`KnowledgeGraph`].
pub struct GraphBuilder;

impl GraphBuilder {
    /// Selective build: one edge per (symptom, disease) pair in the mapping.
    /// A symptom with an empty disease list still gets its node.
    pub fn build<'a, I, D>(symptom_to_diseases: I) -> KnowledgeGraph
    where
        I: IntoIterator<Item = (&'a Symptom, D)>,
        D: IntoIterator<Item = &'a Disease>,
    {
        let mut graph = KnowledgeGraph::new();
        for (symptom, diseases) in symptom_to_diseases {
            graph.add_symptom(symptom);
            for disease in diseases {
                graph.add_edge(symptom, disease, DEFAULT_EDGE_WEIGHT);
            }
        }
        graph
    }

    pub fn from_knowledge_base(kb: &KnowledgeBase) -> KnowledgeGraph {
        let graph = Self::build(kb.iter());
        tracing::debug!(
            symptoms = graph.symptoms().len(),
            diseases = graph.diseases().len(),
            edges = graph.edge_count(),
            "knowledge graph built"
        );
        graph
    }

    /// All-to-all build for symptoms and diseases already paired at note level.
    pub fn build_from_symptoms(symptoms: &[Symptom], diseases: &[Disease]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for symptom in symptoms {
            graph.add_symptom(symptom);
        }
        for disease in diseases {
            graph.add_disease(disease);
        }
        for symptom in symptoms {
            for disease in diseases {
                graph.add_edge(symptom, disease, DEFAULT_EDGE_WEIGHT);
            }
        }
        graph
    }
}
