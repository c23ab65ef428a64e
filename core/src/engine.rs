use crate::boolean::BooleanSearcher;
use crate::corpus::CorpusPaths;
use crate::error::QueryError;
use crate::index::{DocId, InvertedIndex};
use crate::lemmatizer::Lemmatizer;
use crate::ranker::VectorSpaceRanker;
use anyhow::Result;

/// Both search operations over one immutable corpus snapshot.
pub struct SearchEngine {
    index: InvertedIndex,
    ranker: VectorSpaceRanker,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex, ranker: VectorSpaceRanker, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self { index, ranker, lemmatizer }
    }

    /// Loads the serialized index (or builds it from the lemma files when no
    /// index file exists yet) and the lemma-track weight files.
    pub fn open(paths: &CorpusPaths, lemmatizer: Box<dyn Lemmatizer>) -> Result<Self> {
        let index = if paths.index_file.is_file() {
            InvertedIndex::load(&paths.index_file)?
        } else {
            tracing::info!(path = %paths.index_file.display(), "no index file, building from lemmas");
            InvertedIndex::from_lemma_dir(&paths.lemmas)?
        };
        let ranker = VectorSpaceRanker::load(&paths.tfidf_lemmas)?;
        Ok(Self::new(index, ranker, lemmatizer))
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn ranker(&self) -> &VectorSpaceRanker { &self.ranker }

    pub fn boolean_search(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        BooleanSearcher::new(&self.index, self.lemmatizer.as_ref()).search(query)
    }

    pub fn ranked_search(&self, query: &str, k: usize) -> Vec<(DocId, f64)> {
        self.ranker
            .search(query, k)
            .into_iter()
            .map(|hit| (hit.doc_id, hit.score))
            .collect()
    }
}
