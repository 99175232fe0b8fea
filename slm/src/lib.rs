pub mod ner;
pub mod rules;

pub use ner::{Entity, EntityExtractor, EntityLabel};
pub use rules::KeywordExtractor;
