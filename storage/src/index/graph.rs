use clinigraph_core::model::{Disease, NodeKind, Symptom};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Forward edge representation: (disease index, weight)
type EdgeData = (usize, f32);

/// Undirected symptom–disease graph.
///
/// Symptoms and diseases live in separate node tables, so an edge can only
/// ever join a symptom to a disease. Node and edge order follow insertion.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    symptoms: Vec<Symptom>,
    diseases: Vec<Disease>,
    symptom_index: HashMap<Symptom, usize>,
    disease_index: HashMap<Disease, usize>,
    forward: Vec<Vec<EdgeData>>,
    backward: Vec<Vec<usize>>,
    edge_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub kind: NodeKind,
    pub hop: u8,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: returns the existing index when the symptom is already present.
    pub fn add_symptom(&mut self, symptom: &Symptom) -> usize {
        if let Some(idx) = self.symptom_index.get(symptom) {
            return *idx;
        }
        let idx = self.symptoms.len();
        self.symptoms.push(symptom.clone());
        self.symptom_index.insert(symptom.clone(), idx);
        self.forward.push(Vec::new());
        idx
    }

    pub fn add_disease(&mut self, disease: &Disease) -> usize {
        if let Some(idx) = self.disease_index.get(disease) {
            return *idx;
        }
        let idx = self.diseases.len();
        self.diseases.push(disease.clone());
        self.disease_index.insert(disease.clone(), idx);
        self.backward.push(Vec::new());
        idx
    }

    /// Adds both endpoints if missing. Returns `false` when the edge already existed.
    pub fn add_edge(&mut self, symptom: &Symptom, disease: &Disease, weight: f32) -> bool {
        let s = self.add_symptom(symptom);
        let d = self.add_disease(disease);
        if self.forward[s].iter().any(|(target, _)| *target == d) {
            return false;
        }
        self.forward[s].push((d, weight));
        self.backward[d].push(s);
        self.edge_count += 1;
        true
    }

    pub fn contains_symptom(&self, symptom: &str) -> bool {
        self.symptom_idx(symptom).is_some()
    }

    pub fn contains_disease(&self, disease: &str) -> bool {
        self.disease_idx(disease).is_some()
    }

    /// True if `kind` has a node labelled `label`.
    pub fn contains(&self, kind: NodeKind, label: &str) -> bool {
        match kind {
            NodeKind::Symptom => self.contains_symptom(label),
            NodeKind::Disease => self.contains_disease(label),
        }
    }

    pub fn has_edge(&self, symptom: &str, disease: &str) -> bool {
        match (self.symptom_idx(symptom), self.disease_idx(disease)) {
            (Some(s), Some(d)) => self.forward[s].iter().any(|(target, _)| *target == d),
            _ => false,
        }
    }

    pub fn edge_weight(&self, symptom: &str, disease: &str) -> Option<f32> {
        let s = self.symptom_idx(symptom)?;
        let d = self.disease_idx(disease)?;
        self.forward[s]
            .iter()
            .find(|(target, _)| *target == d)
            .map(|(_, weight)| *weight)
    }

    /// Disease neighbours of a symptom. Unknown symptoms have none.
    pub fn diseases_for(&self, symptom: &str) -> Vec<&Disease> {
        self.symptom_idx(symptom)
            .map(|s| {
                self.forward[s]
                    .iter()
                    .map(|(d, _)| &self.diseases[*d])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn symptoms_for(&self, disease: &str) -> Vec<&Symptom> {
        self.disease_idx(disease)
            .map(|d| self.backward[d].iter().map(|s| &self.symptoms[*s]).collect())
            .unwrap_or_default()
    }

    /// Union of disease neighbours over `symptoms`, first-seen order.
    pub fn diseases_for_all<'a, I>(&self, symptoms: I) -> Vec<Disease>
    where
        I: IntoIterator<Item = &'a Symptom>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for symptom in symptoms {
            for disease in self.diseases_for(symptom.as_str()) {
                if seen.insert(disease) {
                    out.push(disease.clone());
                }
            }
        }
        out
    }

    /// Number of edges from `symptoms` into each reachable disease, most supported first.
    /// Equal counts keep first-seen order.
    pub fn disease_support<'a, I>(&self, symptoms: I) -> Vec<(Disease, usize)>
    where
        I: IntoIterator<Item = &'a Symptom>,
    {
        let mut counts: Vec<(usize, usize)> = Vec::new();
        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut visited = HashSet::new();

        for symptom in symptoms {
            let Some(s) = self.symptom_idx(symptom.as_str()) else {
                continue;
            };
            if !visited.insert(s) {
                continue;
            }
            for (d, _) in &self.forward[s] {
                match position.get(d) {
                    Some(pos) => counts[*pos].1 += 1,
                    None => {
                        position.insert(*d, counts.len());
                        counts.push((*d, 1));
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .map(|(d, count)| (self.diseases[d].clone(), count))
            .collect()
    }

    /// 1-hop diseases and 2-hop co-symptoms of a symptom.
    pub fn within_two_hops(&self, symptom: &str) -> Vec<Neighbor> {
        let Some(start) = self.symptom_idx(symptom) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut second_hop = Vec::new();
        let mut seen_symptoms = HashSet::from([start]);

        for (d, _) in &self.forward[start] {
            result.push(Neighbor {
                label: self.diseases[*d].to_string(),
                kind: NodeKind::Disease,
                hop: 1,
            });
            for s in &self.backward[*d] {
                if seen_symptoms.insert(*s) {
                    second_hop.push(Neighbor {
                        label: self.symptoms[*s].to_string(),
                        kind: NodeKind::Symptom,
                        hop: 2,
                    });
                }
            }
        }

        result.extend(second_hop);
        result
    }

    /// Edges from `symptoms` into `diseases` only; the paths that explain a prediction.
    pub fn subgraph(&self, symptoms: &[Symptom], diseases: &[Disease]) -> KnowledgeGraph {
        let wanted: HashSet<&Disease> = diseases.iter().collect();
        let mut out = KnowledgeGraph::new();

        for symptom in symptoms {
            let Some(s) = self.symptom_idx(symptom.as_str()) else {
                continue;
            };
            out.add_symptom(&self.symptoms[s]);
            for (d, weight) in &self.forward[s] {
                let disease = &self.diseases[*d];
                if wanted.contains(disease) {
                    out.add_edge(&self.symptoms[s], disease, *weight);
                }
            }
        }
        out
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Symptom, &Disease, f32)> + '_ {
        self.forward.iter().enumerate().flat_map(move |(s, edges)| {
            edges
                .iter()
                .map(move |(d, weight)| (&self.symptoms[s], &self.diseases[*d], *weight))
        })
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn diseases(&self) -> &[Disease] {
        &self.diseases
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node_count(&self) -> usize {
        self.symptoms.len() + self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    pub fn view(&self) -> GraphView {
        let nodes = self
            .symptoms
            .iter()
            .map(|s| ViewNode {
                label: s.to_string(),
                kind: NodeKind::Symptom,
            })
            .chain(self.diseases.iter().map(|d| ViewNode {
                label: d.to_string(),
                kind: NodeKind::Disease,
            }))
            .collect();

        let edges = self
            .edges()
            .map(|(symptom, disease, weight)| ViewEdge {
                symptom: symptom.to_string(),
                disease: disease.to_string(),
                weight,
            })
            .collect();

        GraphView { nodes, edges }
    }

    fn symptom_idx(&self, raw: &str) -> Option<usize> {
        let key = Symptom::new(raw)?;
        self.symptom_index.get(&key).copied()
    }

    fn disease_idx(&self, raw: &str) -> Option<usize> {
        let key = Disease::new(raw)?;
        self.disease_index.get(&key).copied()
    }
}

/// Render-ready form of a graph, tagged by node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNode {
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub symptom: String,
    pub disease: String,
    pub weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(label: &str) -> Symptom {
        Symptom::new(label).unwrap()
    }

    fn d(label: &str) -> Disease {
        Disease::new(label).unwrap()
    }

    #[test]
    fn test_graph_1hop() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("fever"), &d("flu"), 1.0);
        graph.add_edge(&s("fever"), &d("malaria"), 0.8);

        let neighbors = graph.diseases_for("Fever ");
        assert_eq!(neighbors, vec![&d("flu"), &d("malaria")]);
        assert_eq!(graph.symptoms_for("malaria"), vec![&s("fever")]);
        assert!(graph.diseases_for("cough").is_empty());
    }

    #[test]
    fn test_graph_2hop() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("nausea"), &d("migraine"), 1.0);
        graph.add_edge(&s("headache"), &d("migraine"), 1.0);
        graph.add_edge(&s("vomiting"), &d("migraine"), 1.0);
        graph.add_edge(&s("nausea"), &d("pregnancy"), 1.0);

        let result = graph.within_two_hops("nausea");
        let hop1: Vec<_> = result.iter().filter(|n| n.hop == 1).collect();
        let hop2: Vec<_> = result.iter().filter(|n| n.hop == 2).collect();

        assert_eq!(hop1.len(), 2); // migraine, pregnancy
        assert_eq!(hop2.len(), 2); // headache, vomiting
        assert!(hop2.iter().all(|n| n.kind == NodeKind::Symptom));
        assert!(!hop2.iter().any(|n| n.label == "nausea"));
    }

    #[test]
    fn test_duplicate_edge_is_ignored() {
        let mut graph = KnowledgeGraph::new();
        assert!(graph.add_edge(&s("fever"), &d("flu"), 1.0));
        assert!(!graph.add_edge(&s("FEVER"), &d("flu"), 2.0));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_weight("fever", "flu"), Some(1.0));
    }

    #[test]
    fn test_same_label_on_both_sides_stays_bipartite() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("migraine"), &d("migraine"), 1.0);

        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains_symptom("migraine"));
        assert!(graph.contains_disease("migraine"));
    }

    #[test]
    fn test_disease_support_ranks_by_edge_count() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("fatigue"), &d("depression"), 1.0);
        graph.add_edge(&s("fatigue"), &d("anemia"), 1.0);
        graph.add_edge(&s("dizziness"), &d("vertigo"), 1.0);
        graph.add_edge(&s("dizziness"), &d("anemia"), 1.0);

        let support = graph.disease_support(&[s("fatigue"), s("dizziness"), s("fatigue")]);
        assert_eq!(
            support,
            vec![(d("anemia"), 2), (d("depression"), 1), (d("vertigo"), 1)]
        );
    }

    #[test]
    fn test_subgraph_keeps_only_explaining_paths() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("chest pain"), &d("angina"), 1.0);
        graph.add_edge(&s("chest pain"), &d("anxiety"), 1.0);
        graph.add_edge(&s("fever"), &d("flu"), 1.0);

        let sub = graph.subgraph(&[s("chest pain"), s("cough")], &[d("angina"), d("flu")]);
        assert_eq!(sub.edge_count(), 1);
        assert!(sub.has_edge("chest pain", "angina"));
        assert!(!sub.contains_disease("anxiety"));
        assert!(!sub.contains_symptom("fever"));
        assert!(!sub.contains_symptom("cough"));
    }

    #[test]
    fn test_view_tags_node_kinds() {
        let mut graph = KnowledgeGraph::new();
        graph.add_edge(&s("fever"), &d("flu"), 1.0);

        let view = graph.view();
        assert_eq!(
            view.nodes,
            vec![
                ViewNode {
                    label: "fever".to_string(),
                    kind: NodeKind::Symptom
                },
                ViewNode {
                    label: "flu".to_string(),
                    kind: NodeKind::Disease
                },
            ]
        );
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"kind\":\"symptom\""));
        assert!(json.contains("\"disease\":\"flu\""));
    }
}
