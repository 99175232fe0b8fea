pub mod builder;
pub mod graph;

pub use builder::GraphBuilder;
pub use graph::{GraphView, KnowledgeGraph, Neighbor, ViewEdge, ViewNode};
