//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use soulmate_gateway::api::{ApiServer, ApiState};
use soulmate_gateway::{
    ChatOrchestrator, Error, HistoryScope, Persona, ReplyGenerator, SamplingConfig, SessionStore,
    SpeechChunk,
};
use tower::ServiceExt;

mod common;
use common::{ScriptedCompletion, ScriptedSpeech, fixed_detector, text_only, with_voice};

/// Build a test API router around an orchestrator
fn build_test_router(chat: ChatOrchestrator) -> axum::Router {
    let state = ApiState::new(chat, "soulmate".to_string(), "SoulMate".to_string());
    ApiServer::new(state, 0).router()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_chat(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let completion = ScriptedCompletion::idle();
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["persona_id"], "soulmate");
    assert_eq!(json["persona"], "SoulMate");
    assert_eq!(json["chat_available"], true);
    assert_eq!(json["voice_available"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_health_degraded_without_provider() {
    let persona = Persona::soulmate();
    let generator = ReplyGenerator::new(None, persona.system_prompt.as_str(), SamplingConfig::default());
    let app = build_test_router(ChatOrchestrator::new(&persona, generator, SessionStore::default()));

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["chat_available"], false);
}

#[tokio::test]
async fn test_chat_returns_reply_and_audio() {
    let completion = ScriptedCompletion::new([Some("Hi there!")]);
    let speech = ScriptedSpeech::new(vec![SpeechChunk::audio(vec![0x01, 0x02])]);
    let app = build_test_router(with_voice(&completion, fixed_detector("en"), &speech));

    let (status, json) = send(&app, post_chat(&serde_json::json!({ "message": "Hello" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Hi there!");
    assert_eq!(json["audio"], "AQI=");
    assert_eq!(json["language"], "en");
    assert_eq!(json["voice"], "en-US-AriaNeural");
    assert_eq!(json["outcome"], "replied");
}

#[tokio::test]
async fn test_chat_without_voice_has_null_audio() {
    let completion = ScriptedCompletion::new([Some("hello!")]);
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    let (status, json) = send(&app, post_chat(&serde_json::json!({ "message": "hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "hello!");
    assert!(json["audio"].is_null());
    assert!(json.get("language").is_none());
}

#[tokio::test]
async fn test_chat_empty_message() {
    let completion = ScriptedCompletion::new([Some("unused")]);
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    for body in [
        serde_json::json!({ "message": "" }),
        serde_json::json!({ "message": "  " }),
        serde_json::json!({}),
    ] {
        let (status, json) = send(&app, post_chat(&body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], Persona::soulmate().replies.empty_input);
        assert_eq!(json["outcome"], "empty_input");
        assert!(json["audio"].is_null());
    }

    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn test_chat_provider_failure_is_still_ok() {
    let completion = ScriptedCompletion::new([None]);
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    let (status, json) = send(&app, post_chat(&serde_json::json!({ "message": "hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], Persona::soulmate().replies.degraded);
    assert_eq!(json["outcome"], "degraded");
}

#[tokio::test]
async fn test_history_list_and_clear() {
    let completion = ScriptedCompletion::new([Some("first reply")]);
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    send(&app, post_chat(&serde_json::json!({ "message": "first" }))).await;

    let (status, json) = send(&app, get("/chat/history")).await;
    assert_eq!(status, StatusCode::OK);
    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "first");
    assert_eq!(turns[1]["role"], "assistant");
    assert!(turns[1]["created_at"].is_string());

    let delete = Request::builder()
        .method("DELETE")
        .uri("/chat/history")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 2);

    let (_, json) = send(&app, get("/chat/history")).await;
    assert!(json["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_per_session() {
    let completion = ScriptedCompletion::new([Some("for a"), Some("for b")]);
    let app = build_test_router(text_only(
        &completion,
        SessionStore::new(HistoryScope::Session, None),
    ));

    send(&app, post_chat(&serde_json::json!({ "message": "x", "session_id": "a" }))).await;
    send(&app, post_chat(&serde_json::json!({ "message": "y", "session_id": "b" }))).await;

    let (_, json) = send(&app, get("/chat/history?session_id=b")).await;
    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["content"], "for b");

    let (_, json) = send(&app, get("/chat/history")).await;
    assert!(json["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_voices_endpoint() {
    let completion = ScriptedCompletion::idle();
    let app = build_test_router(text_only(&completion, SessionStore::default()));

    let (status, json) = send(&app, get("/api/voices")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["default"]["voice_id"], "zh-TW-HsiaoChenNeural");
    assert_eq!(json["profiles"].as_array().unwrap().len(), 4);
    assert_eq!(json["profiles"][0]["language"], "en");
    assert_eq!(json["synthesis_available"], false);
}

#[tokio::test]
async fn test_static_page_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>SoulMate</h1>").unwrap();

    let completion = ScriptedCompletion::idle();
    let state = ApiState::new(
        text_only(&completion, SessionStore::default()),
        "soulmate".to_string(),
        "SoulMate".to_string(),
    );
    let app = ApiServer::new(state, 0)
        .static_dir(Some(dir.path().to_path_buf()))
        .router();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>SoulMate</h1>");
}

#[tokio::test]
async fn test_history_lookups_do_not_create_sessions() {
    let completion = ScriptedCompletion::idle();
    let chat = text_only(&completion, SessionStore::new(HistoryScope::Session, None));
    let app = build_test_router(chat.clone());

    for i in 0..50 {
        let (status, json) = send(&app, get(&format!("/chat/history?session_id=guest-{i}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["turns"].as_array().unwrap().is_empty());

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/chat/history?session_id=guest-{i}"))
            .body(Body::empty())
            .unwrap();
        let (_, json) = send(&app, delete).await;
        assert_eq!(json["cleared"], 0);
    }

    assert_eq!(chat.sessions().session_count().await, 0);
}

#[tokio::test]
async fn test_bind_failure_is_io_error() {
    let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let completion = ScriptedCompletion::idle();
    let state = ApiState::new(
        text_only(&completion, SessionStore::default()),
        "soulmate".to_string(),
        "SoulMate".to_string(),
    );

    let result = ApiServer::new(state, port).run().await;
    assert!(matches!(result, Err(Error::Io(_))));
}
