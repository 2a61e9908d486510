//! HTTP gateway: session, converse, generate, and edit routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use stackforge_core::FileSet;
use stackforge_engine::{EditEngine, Generator};
use stackforge_session::SessionStore;

use crate::error::ApiError;

/// Shared application state for the API handlers.
pub struct AppState {
    pub sessions: SessionStore,
    pub generator: Generator,
    pub editor: EditEngine,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:id/messages", post(converse))
        .route("/api/sessions/:id/generate", post(generate))
        .route("/api/sessions/:id/edit", post(edit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);
    info!("gateway listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "stackforge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionResponse {
    session_id: String,
}

async fn start_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<StartSessionResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(StartSessionResponse { session_id }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    reply: String,
}

async fn converse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ConverseRequest>,
) -> Result<Json<ConverseResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let reply = state.generator.converse(&mut session, &request.message).await?;
    Ok(Json(ConverseResponse { reply }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    user_input: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    generated_prompt: String,
    generated_code: String,
    files: FileSet,
    readme: Option<String>,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let generation = state
        .generator
        .generate(&mut session, &request.user_input)
        .await?;
    Ok(Json(GenerateResponse {
        generated_prompt: generation.prompt,
        generated_code: generation.document,
        files: generation.files,
        readme: generation.readme,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditRequest {
    request: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditResponse {
    files: FileSet,
    affected_paths: Vec<String>,
    summary: Option<String>,
}

async fn edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let outcome = state.editor.apply(&mut session, &request.request).await?;
    Ok(Json(EditResponse {
        files: outcome.files,
        affected_paths: outcome.affected,
        summary: outcome.summary,
    }))
}
