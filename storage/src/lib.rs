pub mod corpus;
pub mod index;
pub mod knowledge_base;

pub use corpus::{Corpus, CorpusError, CorpusRecord};
pub use index::{GraphBuilder, GraphView, KnowledgeGraph};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseError};
