//! Flat on-disk formats shared by the pipeline stages.
//!
//! A corpus root holds one token file and one lemma file per document, the
//! per-document TF-IDF outputs of both tracks, and the serialized index:
//!
//! ```text
//! <root>/tokens/<id>.txt        one token per line
//! <root>/lemmas/<id>.txt        <lemma> <token1> ... <tokenN>
//! <root>/tfidf-tokens/<id>.txt  <term> <idf> <tfidf>
//! <root>/tfidf-lemmas/<id>.txt  <term> <idf> <tfidf>
//! <root>/inverted_index.txt     <term>: <doc1>, <doc2>, ...
//! ```

use crate::stats::TfIdfRow;
use crate::DocId;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct CorpusPaths {
    pub tokens: PathBuf,
    pub lemmas: PathBuf,
    pub tfidf_tokens: PathBuf,
    pub tfidf_lemmas: PathBuf,
    pub index_file: PathBuf,
}

impl CorpusPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            tokens: root.join("tokens"),
            lemmas: root.join("lemmas"),
            tfidf_tokens: root.join("tfidf-tokens"),
            tfidf_lemmas: root.join("tfidf-lemmas"),
            index_file: root.join("inverted_index.txt"),
        }
    }

    pub fn token_file(&self, doc_id: &str) -> PathBuf { self.tokens.join(doc_file_name(doc_id)) }
    pub fn lemma_file(&self, doc_id: &str) -> PathBuf { self.lemmas.join(doc_file_name(doc_id)) }
    pub fn tfidf_token_file(&self, doc_id: &str) -> PathBuf { self.tfidf_tokens.join(doc_file_name(doc_id)) }
    pub fn tfidf_lemma_file(&self, doc_id: &str) -> PathBuf { self.tfidf_lemmas.join(doc_file_name(doc_id)) }
}

fn doc_file_name(doc_id: &str) -> String {
    format!("{doc_id}.txt")
}

/// One line of a lemma file: the lemma and the surface tokens recorded under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaLine {
    pub lemma: String,
    pub tokens: Vec<String>,
}

/// Ids of the `*.txt` documents directly inside `dir`, ascending as strings.
pub fn list_document_ids(dir: &Path) -> Result<Vec<DocId>> {
    if !dir.is_dir() {
        anyhow::bail!("document directory {} does not exist", dir.display());
    }
    let mut ids = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let p = entry.path();
        if !entry.file_type().is_file() { continue; }
        if p.extension().and_then(|s| s.to_str()) != Some("txt") { continue; }
        if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

pub fn read_token_file(path: &Path) -> Result<Vec<String>> {
    let f = File::open(path).with_context(|| format!("opening token file {}", path.display()))?;
    let mut tokens = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.with_context(|| format!("reading token file {}", path.display()))?;
        let token = line.trim();
        if token.is_empty() { continue; }
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

pub fn read_lemma_file(path: &Path) -> Result<Vec<LemmaLine>> {
    let f = File::open(path).with_context(|| format!("opening lemma file {}", path.display()))?;
    let mut lines = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.with_context(|| format!("reading lemma file {}", path.display()))?;
        let mut parts = line.split_whitespace();
        let Some(lemma) = parts.next() else { continue };
        lines.push(LemmaLine {
            lemma: lemma.to_string(),
            tokens: parts.map(str::to_string).collect(),
        });
    }
    Ok(lines)
}

pub fn write_tfidf_file(path: &Path, rows: &[TfIdfRow]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for row in rows {
        writeln!(w, "{}", row)?;
    }
    w.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Reads `<term> <idf> <tfidf>` rows, skipping lines that do not parse.
pub fn read_tfidf_file(path: &Path) -> Result<Vec<TfIdfRow>> {
    let f = File::open(path).with_context(|| format!("opening tf-idf file {}", path.display()))?;
    let mut rows = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("reading tf-idf file {}", path.display()))?;
        if line.trim().is_empty() { continue; }
        match line.parse::<TfIdfRow>() {
            Ok(row) => rows.push(row),
            Err(_) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, "skipping malformed tf-idf row");
            }
        }
    }
    Ok(rows)
}

/// Writes an empty file, used when a document's input could not be read.
pub fn write_empty(path: &Path) -> Result<()> {
    write_tfidf_file(path, &[])
}
