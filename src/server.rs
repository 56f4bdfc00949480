//! HTTP surface
//!
//! Thin JSON endpoints over the orchestrator on the application port, and
//! the observability SSE stream on its own port. Handlers run the
//! orchestrator synchronously end-to-end; orchestration never calls back
//! into this layer.

use crate::error::TillerError;
use crate::obs::Broker;
use crate::service::Service;
use crate::types::{Conversation, InboxItem, ModelCall};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Shared state for the JSON API handlers
#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<Service>,
}

/// Router for the JSON API (application port)
pub fn router(svc: Arc<Service>) -> Router {
    Router::new()
        .route("/start", post(handle_start))
        .route("/list", get(handle_list))
        .route("/send", post(handle_send))
        .route("/close", post(handle_close))
        .route("/conversation", get(handle_conversation))
        .route("/conversation/create", post(handle_create))
        .route("/conversation/approve-plan", post(handle_approve_plan))
        .route(
            "/conversation/approve-command",
            post(handle_approve_command),
        )
        .route("/inbox", get(handle_inbox))
        .route("/run", post(handle_run))
        .with_state(AppState { svc })
}

/// Router for the observability stream (separate port)
pub fn obs_router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/events", get(handle_events))
        .with_state(broker)
}

/// API error carrying the HTTP status derived from the error kind
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<TillerError>() {
            Some(TillerError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(
                TillerError::Validation(_)
                | TillerError::State(_)
                | TillerError::Model(_)
                | TillerError::Shell(_),
            ) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(status = %self.status, message = %self.message, "request failed");
        (self.status, self.message).into_response()
    }
}

#[derive(Deserialize)]
struct SendRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct IdRequest {
    #[serde(default)]
    id: String,
}

#[derive(Deserialize)]
struct PromptRequest {
    #[serde(default)]
    prompt: String,
}

#[derive(Deserialize)]
struct ApproveCommandRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    step_id: String,
}

#[derive(Deserialize)]
struct ConversationQuery {
    #[serde(default)]
    id: String,
}

async fn handle_start(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let id = state.svc.start()?;
    Ok(Json(serde_json::json!({ "id": id })))
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.svc.list()?))
}

async fn handle_send(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<ModelCall>, ApiError> {
    let call = state.svc.send(&req.id, &req.message).await?;
    Ok(Json(call))
}

async fn handle_close(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<StatusCode, ApiError> {
    if req.id.is_empty() {
        return Err(anyhow::Error::from(TillerError::Validation(
            "id is required".to_string(),
        ))
        .into());
    }
    state.svc.close(&req.id)?;
    Ok(StatusCode::OK)
}

async fn handle_conversation(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Conversation>, ApiError> {
    if query.id.is_empty() {
        return Err(anyhow::Error::from(TillerError::Validation(
            "id is required".to_string(),
        ))
        .into());
    }
    Ok(Json(state.svc.get(&query.id)?))
}

async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conv = state.svc.create_conversation(&req.prompt).await?;
    Ok(Json(conv))
}

async fn handle_approve_plan(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conv = state.svc.approve_plan(&req.id).await?;
    Ok(Json(conv))
}

async fn handle_approve_command(
    State(state): State<AppState>,
    Json(req): Json<ApproveCommandRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conv = state.svc.approve_command(&req.id, &req.step_id).await?;
    Ok(Json(conv))
}

async fn handle_inbox(State(state): State<AppState>) -> Result<Json<Vec<InboxItem>>, ApiError> {
    Ok(Json(state.svc.list_inbox()?))
}

async fn handle_run(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.svc.plan_and_execute(&req.prompt).await?;
    Ok(Json(serde_json::json!({ "result": result })))
}

/// Stream broker events as `data: <json>` SSE frames until the client
/// disconnects; dropping the stream releases the subscription.
async fn handle_events(
    State(broker): State<Arc<Broker>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let mut sub = broker.subscribe();
    let stream = async_stream::stream! {
        while let Some(event) = sub.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                yield Ok(SseEvent::default().data(json));
            }
        }
    };
    Sse::new(stream)
}
