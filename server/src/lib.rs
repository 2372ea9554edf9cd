use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tfidf_core::{Document, Engine};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct PushDocument {
    pub title: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct CorpusResponse {
    pub documents: Vec<DocumentView>,
}

/// Wire view of a document: the vector is an internal artifact and never
/// crosses the boundary, only the sibling ranking does.
#[derive(Serialize)]
pub struct DocumentView {
    pub id: u64,
    pub title: String,
    pub siblings: Vec<SiblingView>,
}

#[derive(Serialize)]
pub struct SiblingView {
    pub id: u64,
    pub similarity: f64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn build_app(data_dir: String) -> Result<Router> {
    let engine = Engine::open(&data_dir)?;
    let state = AppState { engine: Arc::new(engine) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/documents", put(push_document).get(list_documents))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

/// Ingest one document and answer with the recomputed corpus. A title
/// that already exists is ignored (the body's content is discarded), but
/// the response still carries the full refreshed ranking.
async fn push_document(
    State(state): State<AppState>,
    Json(req): Json<PushDocument>,
) -> Result<Json<CorpusResponse>, (StatusCode, String)> {
    let documents = state
        .engine
        .ingest(&req.title, &req.content)
        .map_err(internal_error)?;
    Ok(Json(corpus_view(documents)))
}

async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<CorpusResponse>, (StatusCode, String)> {
    let documents = state.engine.corpus().map_err(internal_error)?;
    Ok(Json(corpus_view(documents)))
}

fn corpus_view(documents: Vec<Document>) -> CorpusResponse {
    CorpusResponse {
        documents: documents
            .into_iter()
            .map(|d| DocumentView {
                id: d.id,
                title: d.title,
                siblings: d
                    .siblings
                    .into_iter()
                    .map(|s| SiblingView { id: s.id, similarity: s.similarity })
                    .collect(),
            })
            .collect(),
    }
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
