use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

fn test_app(dir: &std::path::Path) -> Router {
    tfidf_server::build_app(dir.join("db").to_string_lossy().to_string()).unwrap()
}

async fn put_document(app: &Router, title: &str, content: &str) -> (StatusCode, Value) {
    let req = Request::put("/documents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": title, "content": content }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn doc<'a>(corpus: &'a Value, title: &str) -> &'a Value {
    corpus["documents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["title"] == title)
        .unwrap()
}

#[tokio::test]
async fn health_answers_ok() {
    let dir = tempdir().unwrap();
    let app = test_app(dir.path());
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], &b"ok"[..]);
}

#[tokio::test]
async fn ingest_returns_the_full_corpus_with_siblings() {
    let dir = tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, first) = put_document(&app, "A", "the cat sat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["documents"].as_array().unwrap().len(), 1);
    assert!(doc(&first, "A")["siblings"].as_array().unwrap().is_empty());

    let (status, second) = put_document(&app, "B", "the dog sat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["documents"].as_array().unwrap().len(), 2);

    let a_siblings = doc(&second, "A")["siblings"].as_array().unwrap();
    let b_siblings = doc(&second, "B")["siblings"].as_array().unwrap();
    assert_eq!(a_siblings.len(), 1);
    assert_eq!(b_siblings.len(), 1);
    assert_eq!(a_siblings[0]["similarity"], b_siblings[0]["similarity"]);
    assert!(a_siblings[0]["similarity"].as_f64().unwrap() > 0.0);
    // vectors never cross the wire
    assert!(doc(&second, "A").get("vector").is_none());
}

#[tokio::test]
async fn duplicate_title_is_ignored_but_still_answered() {
    let dir = tempdir().unwrap();
    let app = test_app(dir.path());
    put_document(&app, "A", "the cat sat").await;
    let (_, before) = put_document(&app, "B", "the dog sat").await;

    let (status, after) = put_document(&app, "A", "entirely new words here").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["documents"].as_array().unwrap().len(), 2);
    assert_eq!(
        doc(&before, "A")["siblings"][0]["similarity"],
        doc(&after, "A")["siblings"][0]["similarity"]
    );
}

#[tokio::test]
async fn get_documents_serves_the_current_view() {
    let dir = tempdir().unwrap();
    let app = test_app(dir.path());
    put_document(&app, "A", "rust systems programming").await;
    put_document(&app, "B", "rust web programming").await;

    let (status, corpus) = get_json(&app, "/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpus["documents"].as_array().unwrap().len(), 2);
    assert!(doc(&corpus, "A")["siblings"][0]["similarity"].as_f64().unwrap() > 0.0);
}
