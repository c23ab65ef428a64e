use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use lemmadex_core::corpus::write_tfidf_file;
use lemmadex_core::{CorpusPaths, InvertedIndex, TfIdfRow};
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn row(term: &str, tf_idf: f64) -> TfIdfRow {
    TfIdfRow { term: term.to_string(), idf: 1.098612, tf_idf }
}

fn build_tiny_corpus(dir: &std::path::Path) {
    let paths = CorpusPaths::new(dir);
    fs::create_dir_all(&paths.lemmas).unwrap();
    fs::write(paths.lemma_file("1"), "кошка кошки\nмолоко молоко\n").unwrap();
    fs::write(paths.lemma_file("2"), "собака собаки\n").unwrap();
    fs::write(paths.lemma_file("10"), "кошка кошка\nсобака собака\n").unwrap();

    InvertedIndex::from_lemma_dir(&paths.lemmas).unwrap().save(&paths.index_file).unwrap();

    // doc 1 leans on "молоко", doc 10 splits its weight
    write_tfidf_file(&paths.tfidf_lemma_file("1"), &[row("кошка", 0.2), row("молоко", 0.6)]).unwrap();
    write_tfidf_file(&paths.tfidf_lemma_file("2"), &[row("собака", 0.4)]).unwrap();
    write_tfidf_file(&paths.tfidf_lemma_file("10"), &[row("кошка", 0.3), row("собака", 0.3)]).unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn app_for(dir: &std::path::Path) -> Router {
    build_tiny_corpus(dir);
    lemmadex_server::build_app(dir, None).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());

    let (status, json) = call(app, "/search?q=%D0%BC%D0%BE%D0%BB%D0%BE%D0%BA%D0%BE%20%D0%BA%D0%BE%D1%88%D0%BA%D0%B0&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"], "1");
    assert_eq!(arr[1]["doc_id"], "10");
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn boolean_returns_sorted_ids() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());

    // "кошки OR собаки", lemmatized through the lemma table
    let (status, json) = call(app, "/boolean?q=%D0%BA%D0%BE%D1%88%D0%BA%D0%B8%20OR%20%D1%81%D0%BE%D0%B1%D0%B0%D0%BA%D0%B8").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["results"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(ids, vec!["1", "10", "2"]);
}

#[tokio::test]
async fn malformed_boolean_query_is_a_bad_request() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());

    let (status, json) = call(app, "/boolean?q=(a%20OR%20b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("parentheses"));
}

#[tokio::test]
async fn empty_queries_return_nothing() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());

    let (status, json) = call(app.clone(), "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["results"].as_array().unwrap().is_empty());

    let (status, json) = call(app, "/boolean").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
}

async fn allowed_origin(cors: Option<&str>, origin: &str) -> Option<String> {
    let app: Router = Router::new()
        .route("/health", axum::routing::get(|| async { "ok" }))
        .layer(lemmadex_server::cors_layer(cors));
    let req = Request::get("/health").header("origin", origin).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    resp.headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn cors_echoes_only_listed_origins() {
    let listed = Some("http://a.example, http://b.example");
    assert_eq!(allowed_origin(listed, "http://b.example").await.as_deref(), Some("http://b.example"));
    assert_eq!(allowed_origin(listed, "http://evil.example").await, None);
    assert_eq!(allowed_origin(None, "http://evil.example").await.as_deref(), Some("*"));
}
