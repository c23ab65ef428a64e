use crate::corpus::{list_document_ids, read_lemma_file};
use crate::error::IndexError;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub type DocId = String;

/// Term → posting set, plus every document id the index knows about.
///
/// Ids are kept in `BTreeSet`s so every listing (serialization, boolean
/// results) comes out ascending as strings: `"1", "10", "2"`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeSet<DocId>>,
    documents: BTreeSet<DocId>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Adds `doc_id` to the posting set of every term in `terms`.
    ///
    /// An id that is already indexed is rejected; call [`remove_document`]
    /// first to re-index it.
    ///
    /// [`remove_document`]: InvertedIndex::remove_document
    pub fn add_document<I, S>(&mut self, doc_id: impl Into<DocId>, terms: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let doc_id = doc_id.into();
        if self.documents.contains(&doc_id) {
            return Err(IndexError::DuplicateDocument(doc_id));
        }
        for term in terms {
            self.postings.entry(term.into()).or_default().insert(doc_id.clone());
        }
        self.documents.insert(doc_id);
        Ok(())
    }

    /// Drops `doc_id` from every posting set. Returns whether it was indexed.
    pub fn remove_document(&mut self, doc_id: &str) -> bool {
        if !self.documents.remove(doc_id) {
            return false;
        }
        self.postings.retain(|_, docs| {
            docs.remove(doc_id);
            !docs.is_empty()
        });
        true
    }

    /// Builds an index by adding documents in ascending id order.
    pub fn build_from_collection<I, T, S>(docs: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (DocId, T)>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut docs: Vec<(DocId, T)> = docs.into_iter().collect();
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut index = Self::new();
        for (doc_id, terms) in docs {
            index.add_document(doc_id, terms)?;
        }
        Ok(index)
    }

    /// Builds the index from a directory of lemma files; a document's terms
    /// are the lemmas listed in its file.
    pub fn from_lemma_dir(dir: &Path) -> Result<Self> {
        let mut collection: Vec<(DocId, Vec<String>)> = Vec::new();
        for doc_id in list_document_ids(dir)? {
            let path = dir.join(format!("{doc_id}.txt"));
            match read_lemma_file(&path) {
                Ok(lines) => {
                    let lemmas = lines.into_iter().map(|l| l.lemma).collect();
                    collection.push((doc_id, lemmas));
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable lemma file");
                }
            }
        }
        let index = Self::build_from_collection(collection)?;
        tracing::info!(num_docs = index.num_documents(), num_terms = index.num_terms(), "built inverted index");
        Ok(index)
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeSet<DocId>> { self.postings.get(term) }

    pub fn documents(&self) -> &BTreeSet<DocId> { &self.documents }

    pub fn terms(&self) -> impl Iterator<Item = &str> { self.postings.keys().map(String::as_str) }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_documents(&self) -> usize { self.documents.len() }

    /// One `term: doc1, doc2, ...` line per term, terms and ids sorted as strings.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (term, docs) in &self.postings {
            if docs.is_empty() { continue; }
            out.push_str(term);
            out.push_str(": ");
            let ids: Vec<&str> = docs.iter().map(String::as_str).collect();
            out.push_str(&ids.join(", "));
            out.push('\n');
        }
        out
    }

    /// Inverse of [`serialize`](InvertedIndex::serialize). Lines without
    /// exactly one `": "` separator are skipped.
    pub fn deserialize(text: &str) -> Self {
        let mut index = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() { continue; }
            let parts: Vec<&str> = line.split(": ").collect();
            let [term, doc_list] = parts.as_slice() else {
                tracing::debug!(line, "skipping malformed index line");
                continue;
            };
            let docs: BTreeSet<DocId> = doc_list
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            if docs.is_empty() { continue; }
            index.documents.extend(docs.iter().cloned());
            index.postings.entry(term.to_string()).or_default().extend(docs);
        }
        index
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(path, self.serialize()).with_context(|| format!("writing index {}", path.display()))?;
        tracing::info!(path = %path.display(), num_terms = self.num_terms(), "saved inverted index");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading index {}", path.display()))?;
        let index = Self::deserialize(&text);
        tracing::info!(path = %path.display(), num_docs = index.num_documents(), num_terms = index.num_terms(), "loaded inverted index");
        Ok(index)
    }
}
