//! Cosine-similarity ranking over per-document TF-IDF weights.
//!
//! Every term seen in any weight file gets a fixed dimension (vocabulary in
//! sorted order). Document vectors are stored sparsely as `(dimension, weight)`
//! pairs and L2-normalized, so a dot product with a normalized query vector is
//! the cosine similarity. Queries are not lemmatized: each distinct
//! lowercased query word found in the vocabulary contributes weight 1.0.

use crate::corpus::{list_document_ids, read_tfidf_file};
use crate::stats::TfIdfRow;
use crate::DocId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct DocumentVector {
    doc_id: DocId,
    /// Sorted by dimension, zero weights omitted.
    weights: Vec<(usize, f64)>,
}

#[derive(Debug, Default, Clone)]
pub struct VectorSpaceRanker {
    vocabulary: BTreeMap<String, usize>,
    documents: Vec<DocumentVector>,
}

impl VectorSpaceRanker {
    /// Builds vectors from in-memory weight rows; documents are ordered by id.
    pub fn from_documents<I>(docs: I) -> Self
    where
        I: IntoIterator<Item = (DocId, Vec<TfIdfRow>)>,
    {
        let mut docs: Vec<(DocId, Vec<TfIdfRow>)> = docs.into_iter().collect();
        docs.sort_by(|a, b| a.0.cmp(&b.0));

        let terms: BTreeSet<&str> = docs
            .iter()
            .flat_map(|(_, rows)| rows.iter().map(|r| r.term.as_str()))
            .collect();
        let vocabulary: BTreeMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(pos, term)| (term.to_string(), pos))
            .collect();

        let documents = docs
            .iter()
            .map(|(doc_id, rows)| {
                let mut dense: BTreeMap<usize, f64> = BTreeMap::new();
                for row in rows {
                    dense.insert(vocabulary[row.term.as_str()], row.tf_idf);
                }
                let mut weights: Vec<(usize, f64)> = dense.into_iter().filter(|&(_, w)| w != 0.0).collect();
                normalize(&mut weights);
                DocumentVector { doc_id: doc_id.clone(), weights }
            })
            .collect();

        Self { vocabulary, documents }
    }

    /// Loads every `<id>.txt` weight file in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut docs = Vec::new();
        for doc_id in list_document_ids(dir)? {
            let path = dir.join(format!("{doc_id}.txt"));
            match read_tfidf_file(&path) {
                Ok(rows) => docs.push((doc_id, rows)),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping weight file"),
            }
        }
        let ranker = Self::from_documents(docs);
        tracing::info!(
            num_docs = ranker.num_documents(),
            num_terms = ranker.vocabulary_len(),
            "loaded document vectors"
        );
        Ok(ranker)
    }

    pub fn num_documents(&self) -> usize { self.documents.len() }

    pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

    pub fn term_position(&self, term: &str) -> Option<usize> { self.vocabulary.get(term).copied() }

    pub fn document_ids(&self) -> impl Iterator<Item = &str> { self.documents.iter().map(|d| d.doc_id.as_str()) }

    /// Top `k` documents by cosine similarity; equal scores are ordered by id.
    pub fn search(&self, query: &str, k: usize) -> Vec<RankedHit> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let dims: BTreeSet<usize> = query
            .to_lowercase()
            .split_whitespace()
            .filter_map(|term| self.term_position(term))
            .collect();
        let query_weight = if dims.is_empty() { 0.0 } else { 1.0 / (dims.len() as f64).sqrt() };

        let mut hits: Vec<RankedHit> = self
            .documents
            .iter()
            .map(|doc| {
                let dot: f64 = doc
                    .weights
                    .iter()
                    .filter(|(dim, _)| dims.contains(dim))
                    .map(|(_, w)| w * query_weight)
                    .sum();
                RankedHit { doc_id: doc.doc_id.clone(), score: dot }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(k);
        tracing::debug!(query, matched_terms = dims.len(), returned = hits.len(), "ranked search");
        hits
    }
}

fn normalize(weights: &mut [(usize, f64)]) {
    let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return;
    }
    for (_, w) in weights.iter_mut() {
        *w /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(term: &str, tf_idf: f64) -> TfIdfRow {
        TfIdfRow { term: term.into(), idf: 1.0, tf_idf }
    }

    #[test]
    fn vectors_are_unit_length() {
        let ranker = VectorSpaceRanker::from_documents(vec![("1".to_string(), vec![row("a", 3.0), row("b", 4.0)])]);
        let hits = ranker.search("a", 10);
        assert!((hits[0].score - 0.6).abs() < 1e-12);
        let hits = ranker.search("a b", 10);
        assert!((hits[0].score - 1.4 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn vocabulary_is_sorted_union() {
        let ranker = VectorSpaceRanker::from_documents(vec![
            ("2".to_string(), vec![row("c", 1.0), row("a", 1.0)]),
            ("1".to_string(), vec![row("b", 1.0)]),
        ]);
        assert_eq!(ranker.vocabulary_len(), 3);
        assert_eq!(ranker.term_position("a"), Some(0));
        assert_eq!(ranker.term_position("c"), Some(2));
        assert_eq!(ranker.document_ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn ties_break_by_document_id() {
        let ranker = VectorSpaceRanker::from_documents(vec![
            ("b".to_string(), vec![row("x", 2.0)]),
            ("a".to_string(), vec![row("x", 5.0)]),
            ("c".to_string(), vec![row("y", 1.0)]),
        ]);
        let ids: Vec<DocId> = ranker.search("X", 10).into_iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(ranker.search("x", 1).len(), 1);
    }

    #[test]
    fn zero_vectors_score_zero() {
        let ranker = VectorSpaceRanker::from_documents(vec![
            ("1".to_string(), vec![row("common", 0.0)]),
            ("2".to_string(), vec![row("rare", 0.7)]),
        ]);
        let hits = ranker.search("common", 10);
        assert!(hits.iter().all(|h| h.score == 0.0));
        assert!(ranker.search("  ", 10).is_empty());
    }
}
