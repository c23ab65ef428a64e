use lemmadex_core::corpus::write_tfidf_file;
use lemmadex_core::{TfIdfRow, VectorSpaceRanker, DEFAULT_TOP_K};
use std::fs;
use tempfile::tempdir;

fn rows(weights: &[(&str, f64)]) -> Vec<TfIdfRow> {
    weights.iter().map(|&(term, w)| TfIdfRow { term: term.to_string(), idf: 1.0, tf_idf: w }).collect()
}

fn profiles() -> Vec<(String, Vec<TfIdfRow>)> {
    vec![
        ("a".to_string(), rows(&[("alpha", 0.9), ("beta", 0.1)])),
        ("b".to_string(), rows(&[("beta", 0.5), ("gamma", 0.5)])),
        ("c".to_string(), rows(&[("alpha", 0.2), ("delta", 0.3), ("gamma", 0.8)])),
    ]
}

#[test]
fn it_ranks_a_document_first_for_its_own_terms() {
    let ranker = VectorSpaceRanker::from_documents(profiles());
    for (doc_id, rows) in profiles() {
        let query: Vec<&str> = rows.iter().map(|r| r.term.as_str()).collect();
        let hits = ranker.search(&query.join(" "), DEFAULT_TOP_K);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].doc_id, doc_id);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn it_scores_within_unit_interval() {
    let ranker = VectorSpaceRanker::from_documents(profiles());
    let hits = ranker.search("beta gamma", DEFAULT_TOP_K);
    assert!((hits[0].score - 1.0).abs() < 1e-9);
    assert!(hits.iter().all(|h| (0.0..=1.0 + 1e-9).contains(&h.score)));
}

#[test]
fn it_ignores_repeated_and_unknown_query_terms() {
    let ranker = VectorSpaceRanker::from_documents(profiles());
    let once = ranker.search("alpha", DEFAULT_TOP_K);
    let repeated = ranker.search("alpha ALPHA omega", DEFAULT_TOP_K);
    assert_eq!(once, repeated);
}

#[test]
fn it_loads_weight_files_from_a_directory() {
    let dir = tempdir().unwrap();
    for (doc_id, rows) in profiles() {
        write_tfidf_file(&dir.path().join(format!("{doc_id}.txt")), &rows).unwrap();
    }
    fs::write(dir.path().join("d.txt"), "alpha 1.0\ngamma 1.000000 0.400000\n").unwrap();

    let ranker = VectorSpaceRanker::load(dir.path()).unwrap();
    assert_eq!(ranker.num_documents(), 4);
    assert_eq!(ranker.vocabulary_len(), 4);
    let hits = ranker.search("gamma", 2);
    assert_eq!(hits.len(), 2);
    // "d" holds only gamma after its malformed row is skipped
    assert_eq!(hits[0].doc_id, "d");
    assert!((hits[0].score - 1.0).abs() < 1e-9);
}
