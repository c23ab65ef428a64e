//! Document frequency, inverse document frequency and TF-IDF weights.
//!
//! Two tracks run side by side with the same shape: raw tokens (one token
//! file per document) and lemmas (one lemma file per document). A lemma's
//! occurrence count is the number of surface tokens recorded under it, not
//! one per lemma line.

use crate::corpus::{self, CorpusPaths, LemmaLine};
use crate::DocId;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub type DfTable = BTreeMap<String, usize>;
pub type IdfTable = HashMap<String, f64>;
pub type TfTable = BTreeMap<String, f64>;

/// One output row: `<term> <idf> <tfidf>`, both numbers with six decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfRow {
    pub term: String,
    pub idf: f64,
    pub tf_idf: f64,
}

impl fmt::Display for TfIdfRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.6} {:.6}", self.term, self.idf, self.tf_idf)
    }
}

#[derive(Debug, Error)]
#[error("malformed tf-idf row `{0}`")]
pub struct ParseRowError(String);

impl FromStr for TfIdfRow {
    type Err = ParseRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        let [term, idf, tf_idf] = fields.as_slice() else {
            return Err(ParseRowError(s.to_string()));
        };
        let parse = |v: &str| v.parse::<f64>().map_err(|_| ParseRowError(s.to_string()));
        Ok(Self { term: term.to_string(), idf: parse(*idf)?, tf_idf: parse(*tf_idf)? })
    }
}

#[derive(Debug, Default, Clone)]
pub struct DocumentFrequencies {
    pub tokens: DfTable,
    pub lemmas: DfTable,
    /// Documents with at least one readable input file.
    pub processed: usize,
}

/// Counts, per track, how many documents contain each distinct term.
///
/// Unreadable files are skipped for their own track only.
pub fn document_frequencies(paths: &CorpusPaths, doc_ids: &[DocId]) -> DocumentFrequencies {
    let mut df = DocumentFrequencies::default();
    for doc_id in doc_ids {
        let mut processed = false;

        let token_path = paths.token_file(doc_id);
        match corpus::read_token_file(&token_path) {
            Ok(tokens) => {
                let distinct: BTreeSet<String> = tokens.into_iter().collect();
                count_distinct(&mut df.tokens, distinct);
                processed = true;
            }
            Err(err) => tracing::warn!(path = %token_path.display(), error = %err, "token file skipped for df"),
        }

        let lemma_path = paths.lemma_file(doc_id);
        match corpus::read_lemma_file(&lemma_path) {
            Ok(lines) => {
                let distinct: BTreeSet<String> = lines.into_iter().map(|l| l.lemma).collect();
                count_distinct(&mut df.lemmas, distinct);
                processed = true;
            }
            Err(err) => tracing::warn!(path = %lemma_path.display(), error = %err, "lemma file skipped for df"),
        }

        if processed {
            df.processed += 1;
        }
    }
    tracing::info!(
        processed = df.processed,
        distinct_tokens = df.tokens.len(),
        distinct_lemmas = df.lemmas.len(),
        "document frequencies computed"
    );
    df
}

fn count_distinct(table: &mut DfTable, terms: BTreeSet<String>) {
    for term in terms {
        *table.entry(term).or_insert(0) += 1;
    }
}

/// `idf = ln(n / df)` for every term with `df > 0`; empty when `n == 0`.
pub fn inverse_document_frequencies(df: &DfTable, n: usize) -> IdfTable {
    if n == 0 {
        return IdfTable::new();
    }
    df.iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(term, &count)| (term.clone(), (n as f64 / count as f64).ln()))
        .collect()
}

/// Occurrence count of each token over all token occurrences in the document.
pub fn token_term_frequencies(tokens: &[String]) -> TfTable {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    relative(counts, tokens.len())
}

/// Aggregated surface-token count of each lemma over the document total.
pub fn lemma_term_frequencies(lines: &[LemmaLine]) -> TfTable {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0;
    for line in lines {
        *counts.entry(line.lemma.clone()).or_insert(0) += line.tokens.len();
        total += line.tokens.len();
    }
    relative(counts, total)
}

fn relative(counts: BTreeMap<String, usize>, total: usize) -> TfTable {
    if total == 0 {
        return TfTable::new();
    }
    counts.into_iter().map(|(term, c)| (term, c as f64 / total as f64)).collect()
}

/// Weights every term of `tf`; terms without an idf entry weigh 0.
pub fn tf_idf_rows(tf: &TfTable, idf: &IdfTable) -> Vec<TfIdfRow> {
    tf.iter()
        .map(|(term, &tf)| {
            let idf = idf.get(term).copied().unwrap_or(0.0);
            TfIdfRow { term: term.clone(), idf, tf_idf: tf * idf }
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub documents: usize,
    pub processed: usize,
    pub distinct_tokens: usize,
    pub distinct_lemmas: usize,
    pub files_written: usize,
    pub files_failed: usize,
}

/// Runs DF → IDF → TF-IDF over a corpus and writes both tracks' weight files.
pub struct StatisticsComputer {
    paths: CorpusPaths,
}

impl StatisticsComputer {
    pub fn new(paths: CorpusPaths) -> Self {
        Self { paths }
    }

    pub fn run(&self) -> Result<StatsReport> {
        let doc_ids = self.document_ids()?;
        let df = document_frequencies(&self.paths, &doc_ids);
        if df.processed == 0 {
            bail!("none of the {} documents had a readable token or lemma file", doc_ids.len());
        }
        let token_idf = inverse_document_frequencies(&df.tokens, df.processed);
        let lemma_idf = inverse_document_frequencies(&df.lemmas, df.processed);

        let mut report = StatsReport {
            documents: doc_ids.len(),
            processed: df.processed,
            distinct_tokens: df.tokens.len(),
            distinct_lemmas: df.lemmas.len(),
            ..StatsReport::default()
        };

        for doc_id in &doc_ids {
            let token_rows = corpus::read_token_file(&self.paths.token_file(doc_id))
                .map(|tokens| tf_idf_rows(&token_term_frequencies(&tokens), &token_idf));
            self.emit(&self.paths.tfidf_token_file(doc_id), token_rows, &mut report);

            let lemma_rows = corpus::read_lemma_file(&self.paths.lemma_file(doc_id))
                .map(|lines| tf_idf_rows(&lemma_term_frequencies(&lines), &lemma_idf));
            self.emit(&self.paths.tfidf_lemma_file(doc_id), lemma_rows, &mut report);
        }

        tracing::info!(
            files_written = report.files_written,
            files_failed = report.files_failed,
            tokens_dir = %self.paths.tfidf_tokens.display(),
            lemmas_dir = %self.paths.tfidf_lemmas.display(),
            "tf-idf weights written"
        );
        Ok(report)
    }

    /// Union of the ids found in the token and lemma directories.
    fn document_ids(&self) -> Result<Vec<DocId>> {
        let mut ids = BTreeSet::new();
        let mut listed = false;
        for dir in [&self.paths.tokens, &self.paths.lemmas] {
            match corpus::list_document_ids(dir) {
                Ok(found) => {
                    ids.extend(found);
                    listed = true;
                }
                Err(err) => tracing::warn!(error = %err, "document directory skipped"),
            }
        }
        if !listed {
            bail!(
                "neither {} nor {} could be listed",
                self.paths.tokens.display(),
                self.paths.lemmas.display()
            );
        }
        Ok(ids.into_iter().collect())
    }

    /// Writes `rows`, or an empty file when the input could not be read.
    fn emit(&self, out: &Path, rows: Result<Vec<TfIdfRow>>, report: &mut StatsReport) {
        let written = match rows {
            Ok(rows) => corpus::write_tfidf_file(out, &rows),
            Err(err) => {
                tracing::warn!(path = %out.display(), error = %err, "input unreadable, writing empty weights");
                report.files_failed += 1;
                corpus::write_empty(out)
            }
        };
        match written {
            Ok(()) => report.files_written += 1,
            Err(err) => {
                tracing::warn!(path = %out.display(), error = %err, "could not write weights");
                report.files_failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn token_tf_counts_every_occurrence() {
        let tf = token_term_frequencies(&strings(&["a", "b", "a", "c"]));
        assert_eq!(tf["a"], 0.5);
        assert_eq!(tf["b"], 0.25);
        assert!((tf.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lemma_tf_uses_token_counts() {
        let lines = vec![
            LemmaLine { lemma: "кот".into(), tokens: strings(&["кот", "кота", "коты"]) },
            LemmaLine { lemma: "пёс".into(), tokens: strings(&["пса"]) },
            LemmaLine { lemma: "пусто".into(), tokens: vec![] },
        ];
        let tf = lemma_term_frequencies(&lines);
        assert_eq!(tf["кот"], 0.75);
        assert_eq!(tf["пёс"], 0.25);
        assert_eq!(tf["пусто"], 0.0);
    }

    #[test]
    fn idf_is_natural_log_ratio() {
        let mut df = DfTable::new();
        df.insert("everywhere".into(), 4);
        df.insert("rare".into(), 1);
        let idf = inverse_document_frequencies(&df, 4);
        assert_eq!(idf["everywhere"], 0.0);
        assert!((idf["rare"] - 4f64.ln()).abs() < 1e-12);
        assert!(inverse_document_frequencies(&df, 0).is_empty());
    }

    #[test]
    fn rows_format_with_six_decimals() {
        let row = TfIdfRow { term: "кот".into(), idf: 1.0986122886681098, tf_idf: 0.5 };
        assert_eq!(row.to_string(), "кот 1.098612 0.500000");
        let parsed: TfIdfRow = "кот 1.098612 0.500000".parse().unwrap();
        assert_eq!(parsed.tf_idf, 0.5);
        assert!("кот 1.0".parse::<TfIdfRow>().is_err());
        assert!("кот x 1.0".parse::<TfIdfRow>().is_err());
    }

    #[test]
    fn unknown_terms_weigh_zero() {
        let tf = token_term_frequencies(&strings(&["seen", "unseen"]));
        let mut idf = IdfTable::new();
        idf.insert("seen".into(), 2.0);
        let rows = tf_idf_rows(&tf, &idf);
        assert_eq!(rows[0], TfIdfRow { term: "seen".into(), idf: 2.0, tf_idf: 1.0 });
        assert_eq!(rows[1].tf_idf, 0.0);
    }
}
