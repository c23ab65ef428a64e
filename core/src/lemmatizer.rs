//! Word canonicalization.
//!
//! The boolean engine only relies on [`Lemmatizer::normalize`] being
//! deterministic: identical inputs map to identical canonical forms within one
//! run. Which morphology sits behind it is the caller's choice.

use crate::corpus::{list_document_ids, read_lemma_file, LemmaLine};
use anyhow::{bail, Result};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

pub trait Lemmatizer: Send + Sync {
    fn normalize(&self, word: &str) -> String;
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for Box<L> {
    fn normalize(&self, word: &str) -> String { (**self).normalize(word) }
}

fn fold(word: &str) -> String {
    word.nfkc().collect::<String>().to_lowercase()
}

/// NFKC + lowercase, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowercaseLemmatizer;

impl Lemmatizer for LowercaseLemmatizer {
    fn normalize(&self, word: &str) -> String { fold(word) }
}

/// Snowball stemming on top of [`LowercaseLemmatizer`].
pub struct StemmingLemmatizer {
    stemmer: Stemmer,
}

impl StemmingLemmatizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { stemmer: Stemmer::create(algorithm) }
    }

    pub fn for_language(name: &str) -> Result<Self> {
        let algorithm = match name.to_lowercase().as_str() {
            "danish" => Algorithm::Danish,
            "dutch" => Algorithm::Dutch,
            "english" => Algorithm::English,
            "finnish" => Algorithm::Finnish,
            "french" => Algorithm::French,
            "german" => Algorithm::German,
            "hungarian" => Algorithm::Hungarian,
            "italian" => Algorithm::Italian,
            "norwegian" => Algorithm::Norwegian,
            "portuguese" => Algorithm::Portuguese,
            "romanian" => Algorithm::Romanian,
            "russian" => Algorithm::Russian,
            "spanish" => Algorithm::Spanish,
            "swedish" => Algorithm::Swedish,
            "turkish" => Algorithm::Turkish,
            other => bail!("no stemmer for language `{other}`"),
        };
        Ok(Self::new(algorithm))
    }
}

impl Lemmatizer for StemmingLemmatizer {
    fn normalize(&self, word: &str) -> String {
        self.stemmer.stem(&fold(word)).into_owned()
    }
}

/// Surface form → lemma lookup recovered from the per-document lemma files.
///
/// A known lemma always maps to itself, even when the same string is also a
/// surface form of another lemma. Unknown words fall back to their folded form.
#[derive(Debug, Default, Clone)]
pub struct LemmaTable {
    lemmas: HashMap<String, String>,
    forms: HashMap<String, String>,
}

impl LemmaTable {
    pub fn new() -> Self { Self::default() }

    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a LemmaLine>,
    {
        let mut table = Self::new();
        table.extend_lines(lines);
        table
    }

    pub fn extend_lines<'a, I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = &'a LemmaLine>,
    {
        for line in lines {
            self.insert_lemma(&line.lemma);
            for token in &line.tokens {
                self.insert(token, &line.lemma);
            }
        }
    }

    pub fn from_lemma_dir(dir: &Path) -> Result<Self> {
        let mut table = Self::new();
        let ids = list_document_ids(dir)?;
        for id in &ids {
            let path = dir.join(format!("{id}.txt"));
            match read_lemma_file(&path) {
                Ok(lines) => table.extend_lines(&lines),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping lemma file"),
            }
        }
        tracing::info!(num_docs = ids.len(), num_forms = table.len(), "loaded lemma table");
        Ok(table)
    }

    pub fn insert_lemma(&mut self, lemma: &str) {
        keep_smallest(&mut self.lemmas, fold(lemma), lemma);
    }

    /// Records surface `form` under `lemma`; with competing lemmas the smallest wins.
    pub fn insert(&mut self, form: &str, lemma: &str) {
        keep_smallest(&mut self.forms, fold(form), lemma);
    }

    pub fn len(&self) -> usize { self.lemmas.len() + self.forms.len() }
    pub fn is_empty(&self) -> bool { self.lemmas.is_empty() && self.forms.is_empty() }
}

fn keep_smallest(map: &mut HashMap<String, String>, key: String, lemma: &str) {
    match map.get_mut(&key) {
        Some(existing) if existing.as_str() <= lemma => {}
        Some(existing) => *existing = lemma.to_string(),
        None => {
            map.insert(key, lemma.to_string());
        }
    }
}

impl Lemmatizer for LemmaTable {
    fn normalize(&self, word: &str) -> String {
        let key = fold(word);
        match self.lemmas.get(&key).or_else(|| self.forms.get(&key)) {
            Some(lemma) => lemma.clone(),
            None => key,
        }
    }
}

/// Picks the canonicalizer for query terms: a Snowball stemmer when a
/// language is named, otherwise the lemma table of `lemma_dir` when it exists,
/// otherwise plain lowercasing.
pub fn lemmatizer_for(stemmer: Option<&str>, lemma_dir: &Path) -> Result<Box<dyn Lemmatizer>> {
    if let Some(language) = stemmer {
        return Ok(Box::new(StemmingLemmatizer::for_language(language)?));
    }
    if lemma_dir.is_dir() {
        return Ok(Box::new(LemmaTable::from_lemma_dir(lemma_dir)?));
    }
    tracing::warn!(path = %lemma_dir.display(), "no lemma directory, query terms are only lowercased");
    Ok(Box::new(LowercaseLemmatizer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_folds_compatibility_forms() {
        assert_eq!(LowercaseLemmatizer.normalize("Ｃａｔ"), "cat");
    }

    #[test]
    fn stemmer_reduces_inflections() {
        let l = StemmingLemmatizer::for_language("english").unwrap();
        assert_eq!(l.normalize("Running"), l.normalize("runs"));
        assert!(StemmingLemmatizer::for_language("klingon").is_err());
    }

    #[test]
    fn table_maps_forms_and_falls_back() {
        let lines = vec![
            LemmaLine { lemma: "кот".into(), tokens: vec!["коты".into(), "кота".into()] },
            LemmaLine { lemma: "стать".into(), tokens: vec!["стали".into()] },
            LemmaLine { lemma: "сталь".into(), tokens: vec!["стали".into()] },
        ];
        let table = LemmaTable::from_lines(&lines);
        assert_eq!(table.normalize("Коты"), "кот");
        assert_eq!(table.normalize("кот"), "кот");
        assert_eq!(table.normalize("стали"), "сталь");
        assert_eq!(table.normalize("Собака"), "собака");
    }

    #[test]
    fn table_keeps_lemmas_mapped_to_themselves() {
        let lines = vec![
            LemmaLine { lemma: "три".into(), tokens: vec!["три".into()] },
            LemmaLine { lemma: "тереть".into(), tokens: vec!["три".into(), "трёт".into()] },
        ];
        let table = LemmaTable::from_lines(&lines);
        assert_eq!(table.normalize("три"), "три");
        assert_eq!(table.normalize("трёт"), "тереть");
    }
}
