//! HTTP API integration tests
//!
//! Drive the JSON surface end-to-end against a scripted model driver,
//! mirroring the flows an operator UI performs: create a conversation,
//! approve the plan, answer gates, and watch the inbox.

mod common;

use axum::http::{Method, StatusCode};
use common::{api_router, get_json, post_json, request, ScriptedModel, ScriptedResponse};
use serde_json::json;
use tiller::types::{Conversation, ConversationState, InboxItem, ModelCall, StepStatus};

#[tokio::test]
async fn create_list_get_flow() {
    let model = ScriptedModel::new(vec![ScriptedResponse::new(
        "1) plan step",
        "raw-plan",
        "sess-1",
    )]);
    let app = api_router(model.clone());

    let (status, created) = post_json::<Conversation>(
        &app,
        "/conversation/create",
        json!({"prompt": "Ship feature"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = created.unwrap();
    assert_eq!(created.session_id, "sess-1");
    assert_eq!(created.state, ConversationState::AwaitingPlanApproval);
    assert!(!created.awaiting_reason.is_empty());
    assert_eq!(created.plan_text, "1) plan step");
    assert_eq!(created.steps.len(), 1);
    assert_eq!(created.plan_version, 1);

    let (status, ids) = get_json::<Vec<String>>(&app, "/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids.unwrap(), vec!["sess-1".to_string()]);

    let (status, fetched) = get_json::<Conversation>(&app, "/conversation?id=sess-1").await;
    assert_eq!(status, StatusCode::OK);
    let fetched = fetched.unwrap();
    assert_eq!(fetched.prompt, "Ship feature");
    assert_eq!(fetched.plan_version, 1);

    let (status, inbox) = get_json::<Vec<InboxItem>>(&app, "/inbox").await;
    assert_eq!(status, StatusCode::OK);
    let inbox = inbox.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].state, ConversationState::AwaitingPlanApproval);
}

#[tokio::test]
async fn approve_plan_completes_execution() {
    let model = ScriptedModel::new(vec![
        ScriptedResponse::new("1) verify", "raw-plan", "sess-2"),
        ScriptedResponse::new("SUCCESS: done", "raw-exec", "sess-2"),
    ]);
    let app = api_router(model.clone());

    let (status, created) = post_json::<Conversation>(
        &app,
        "/conversation/create",
        json!({"prompt": "Finish milestone"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = created.unwrap();

    let (status, updated) = post_json::<Conversation>(
        &app,
        "/conversation/approve-plan",
        json!({"id": created.session_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = updated.unwrap();
    assert_eq!(updated.state, ConversationState::Completed);
    assert!(updated.completed_message.contains("Last response"));
    assert_eq!(updated.steps[0].status, StepStatus::Done);
    assert_eq!(updated.model_calls.len(), 2);
    assert!(updated.completed_at.is_some());

    // Completed conversations surface in the inbox for auditing.
    let (_, inbox) = get_json::<Vec<InboxItem>>(&app, "/inbox").await;
    let inbox = inbox.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].state, ConversationState::Completed);
}

#[tokio::test]
async fn send_creates_chat_conversation() {
    let model = ScriptedModel::new(vec![ScriptedResponse::new("pong", "raw-chat", "chat-1")]);
    let app = api_router(model.clone());

    let (status, call) =
        post_json::<ModelCall>(&app, "/send", json!({"id": "", "message": "ping"})).await;
    assert_eq!(status, StatusCode::OK);
    let call = call.unwrap();
    assert_eq!(call.reply, "pong");
    assert_eq!(call.session_id, "chat-1");
    assert!(call.duration_ms > 0);

    let (_, conv) = get_json::<Conversation>(&app, "/conversation?id=chat-1").await;
    let conv = conv.unwrap();
    assert_eq!(conv.messages.len(), 2);
    assert_eq!(conv.messages[0].content, "ping");
    assert_eq!(conv.messages[1].content, "pong");
    assert_eq!(conv.model_calls.len(), 1);
    // Chat-only flow never enters the execution state machine.
    assert_eq!(conv.state, ConversationState::Unset);

    assert_eq!(model.remaining(), 0);
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("ping"));
}

#[tokio::test]
async fn approve_command_flow_over_http() {
    let model = ScriptedModel::new(vec![
        ScriptedResponse::new("1) inspect", "raw-plan", "sess-3"),
        ScriptedResponse::new("COMMAND: echo inspected", "raw-exec", "sess-3"),
        ScriptedResponse::new("SUCCESS: looked around", "raw-exec2", "sess-3"),
    ]);
    let app = api_router(model);

    let (_, created) = post_json::<Conversation>(
        &app,
        "/conversation/create",
        json!({"prompt": "Inspect the box"}),
    )
    .await;
    let created = created.unwrap();

    let (_, waiting) = post_json::<Conversation>(
        &app,
        "/conversation/approve-plan",
        json!({"id": created.session_id}),
    )
    .await;
    let waiting = waiting.unwrap();
    assert_eq!(waiting.state, ConversationState::AwaitingCommand);
    assert_eq!(waiting.steps[0].pending_command, "echo inspected");

    let (status, done) = post_json::<Conversation>(
        &app,
        "/conversation/approve-command",
        json!({"id": waiting.session_id, "step_id": "step-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let done = done.unwrap();
    assert_eq!(done.state, ConversationState::Completed);
    assert!(done.steps[0]
        .logs
        .iter()
        .any(|l| l == "EXEC: echo inspected"));
    assert_eq!(done.artifacts.len(), 1);
    assert!(done.artifacts[0].content.contains("inspected"));
}

#[tokio::test]
async fn run_executes_one_shot() {
    let model = ScriptedModel::new(vec![
        ScriptedResponse::new("1) everything", "raw-plan", "sess-4"),
        ScriptedResponse::new("SUCCESS: shipped", "raw-exec", "sess-4"),
    ]);
    let app = api_router(model);

    let (status, result) = post_json::<serde_json::Value>(
        &app,
        "/run",
        json!({"prompt": "Do it all"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = result.unwrap();
    assert_eq!(
        result["result"],
        "Conversation sess-4 completed with state completed"
    );
}

#[tokio::test]
async fn start_returns_legacy_placeholder() {
    let app = api_router(ScriptedModel::new(vec![]));
    let (status, body) = post_json::<serde_json::Value>(&app, "/start", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), json!({"id": ""}));
}

#[tokio::test]
async fn close_deletes_conversation() {
    let model = ScriptedModel::new(vec![ScriptedResponse::new("1) a", "raw", "sess-5")]);
    let app = api_router(model);

    let (_, created) =
        post_json::<Conversation>(&app, "/conversation/create", json!({"prompt": "Close me"}))
            .await;
    let id = created.unwrap().session_id;

    let (status, _) = request(&app, Method::POST, "/close", Some(json!({"id": id}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_json::<Conversation>(&app, "/conversation?id=sess-5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_and_status_mapping() {
    let app = api_router(ScriptedModel::new(vec![]));

    // Missing id on /conversation.
    let (status, _) = request(&app, Method::GET, "/conversation", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown session is 404.
    let (status, _) = request(&app, Method::GET, "/conversation?id=nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty prompt is a validation error.
    let (status, _) = request(
        &app,
        Method::POST,
        "/conversation/create",
        Some(json!({"prompt": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty message on /send.
    let (status, _) = request(
        &app,
        Method::POST,
        "/send",
        Some(json!({"id": "", "message": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing id on /close.
    let (status, _) = request(&app, Method::POST, "/close", Some(json!({"id": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Wrong method.
    let (status, _) = request(&app, Method::GET, "/send", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // Approving an unknown conversation is 404.
    let (status, _) = request(
        &app,
        Method::POST,
        "/conversation/approve-plan",
        Some(json!({"id": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn model_failure_on_create_returns_400_and_persists_nothing() {
    // No scripted responses: the first model call fails.
    let app = api_router(ScriptedModel::new(vec![]));

    let (status, _) = request(
        &app,
        Method::POST,
        "/conversation/create",
        Some(json!({"prompt": "Doomed"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, ids) = get_json::<Vec<String>>(&app, "/list").await;
    assert!(ids.unwrap().is_empty());
}

#[tokio::test]
async fn events_endpoint_streams() {
    use std::sync::Arc;
    use tiller::obs::Broker;

    let broker = Arc::new(Broker::new());
    let app = tiller::server::obs_router(Arc::clone(&broker));

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .method(Method::GET)
            .uri("/events")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}
