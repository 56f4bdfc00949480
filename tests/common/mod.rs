//! Shared harness for HTTP API integration tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tiller::error::Result;
use tiller::model::{ModelDriver, ModelReply};
use tiller::prompts::PromptSet;
use tiller::service::Service;
use tiller::shell::SystemShell;
use tiller::store::MemoryStore;
use tiller::TillerError;
use tower::ServiceExt;

/// One canned driver response.
pub struct ScriptedResponse {
    pub reply: &'static str,
    pub raw: &'static str,
    pub session_id: &'static str,
    pub duration: i64,
}

impl ScriptedResponse {
    pub fn new(reply: &'static str, raw: &'static str, session_id: &'static str) -> Self {
        Self {
            reply,
            raw,
            session_id,
            duration: 10,
        }
    }
}

/// Deterministic model driver double that returns queued responses and
/// records every prompt it was sent.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ScriptedResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelDriver for ScriptedModel {
    async fn send(&self, session_id: &str, prompt: &str) -> Result<ModelReply> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TillerError::Model("no scripted responses left".to_string()))?;
        let session = if response.session_id.is_empty() {
            if session_id.is_empty() {
                "sess-scripted".to_string()
            } else {
                session_id.to_string()
            }
        } else {
            response.session_id.to_string()
        };
        Ok(ModelReply {
            reply: response.reply.to_string(),
            raw_output: response.raw.to_string(),
            session_id: session,
            duration_ms: response.duration,
        })
    }
}

/// JSON API router over an in-memory service with the scripted driver.
pub fn api_router(model: Arc<ScriptedModel>) -> Router {
    let svc = Arc::new(Service::new(
        Arc::new(MemoryStore::new()),
        model,
        Arc::new(SystemShell::new()),
        None,
        PromptSet::builtin(),
    ));
    tiller::server::router(svc)
}

/// Issue one request against the router, returning status and raw body.
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

/// POST a JSON body and decode the JSON response.
pub async fn post_json<T: serde::de::DeserializeOwned>(
    app: &Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, Option<T>) {
    let (status, bytes) = request(app, Method::POST, path, Some(body)).await;
    (status, serde_json::from_slice(&bytes).ok())
}

/// GET a path and decode the JSON response.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    app: &Router,
    path: &str,
) -> (StatusCode, Option<T>) {
    let (status, bytes) = request(app, Method::GET, path, None).await;
    (status, serde_json::from_slice(&bytes).ok())
}
