pub mod boolean;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod lemmatizer;
pub mod ranker;
pub mod stats;

pub use boolean::BooleanSearcher;
pub use corpus::CorpusPaths;
pub use engine::SearchEngine;
pub use error::{IndexError, QueryError};
pub use index::{DocId, InvertedIndex};
pub use lemmatizer::{lemmatizer_for, LemmaTable, Lemmatizer, LowercaseLemmatizer, StemmingLemmatizer};
pub use ranker::{RankedHit, VectorSpaceRanker, DEFAULT_TOP_K};
pub use stats::{StatisticsComputer, StatsReport, TfIdfRow};
