//! HTTP API tests for the meeting assistant.
//!
//! Drives the real router with a channel-backed agent so tests can play
//! call events and observe the transcript and status endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assistant_service::agent::{AgentError, AgentEvent, BotIdentity, MeetingAgent};
use assistant_service::registry::CallRegistry;
use assistant_service::routes::{build_routes, AppState};
use assistant_service::runner::AssistantRunner;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tower::ServiceExt;

// ============================================================================
// Test agent
// ============================================================================

/// Agent whose call events are pushed by the test.
#[derive(Default)]
struct ChannelAgent {
    sessions: Mutex<HashMap<String, mpsc::Sender<AgentEvent>>>,
    joins: Mutex<Vec<(String, BotIdentity)>>,
    prompts: Mutex<Vec<String>>,
    join_error: Option<String>,
    joined: Notify,
}

impl ChannelAgent {
    fn failing_join(message: &str) -> Self {
        Self {
            join_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    async fn emit(&self, call_id: &str, event: AgentEvent) {
        let sender = self.sessions.lock().unwrap().get(call_id).cloned();
        sender.expect("call not joined").send(event).await.unwrap();
    }

    fn end(&self, call_id: &str) {
        self.sessions.lock().unwrap().remove(call_id);
    }

    fn joins(&self) -> Vec<(String, BotIdentity)> {
        self.joins.lock().unwrap().clone()
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingAgent for ChannelAgent {
    async fn join(
        &self,
        call_id: &str,
        bot: &BotIdentity,
    ) -> Result<mpsc::Receiver<AgentEvent>, AgentError> {
        self.joins
            .lock()
            .unwrap()
            .push((call_id.to_string(), bot.clone()));

        let result = match &self.join_error {
            Some(message) => Err(AgentError::Join(message.clone())),
            None => {
                let (tx, rx) = mpsc::channel(16);
                self.sessions.lock().unwrap().insert(call_id.to_string(), tx);
                Ok(rx)
            }
        };
        self.joined.notify_one();
        result
    }

    async fn respond(&self, _call_id: &str, prompt: &str) -> Result<(), AgentError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    agent: Arc<ChannelAgent>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_agent(ChannelAgent::default())
    }

    fn with_agent(agent: ChannelAgent) -> Self {
        let agent = Arc::new(agent);
        let runner = AssistantRunner {
            agent: agent.clone(),
            registry: Arc::new(CallRegistry::new()),
            bot: BotIdentity {
                user_id: "meeting-assistant-bot".to_string(),
                name: "Meeting Assistant".to_string(),
            },
            trigger_phrase: "hey assistant".to_string(),
        };

        // Handle from an uninstalled recorder; the global recorder can only
        // be installed once per process.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let router = build_routes(Arc::new(AppState { runner }), handle);

        Self { router, agent }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn start(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/start-assistant")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    /// Launch and wait until the agent has joined.
    async fn launch(&self, call_id: &str) {
        let (status, _) = self.start(json!({ "call_id": call_id })).await;
        assert_eq!(status, StatusCode::OK);
        self.agent.joined.notified().await;
    }

    /// Poll `uri` until `check` accepts the body.
    async fn wait_for(&self, uri: &str, check: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..100 {
            let (_, body) = self.get_json(uri).await;
            if check(&body) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let (_, body) = self.get_json(uri).await;
        assert!(check(&body), "condition never held for {uri}: {body}");
        body
    }
}

fn transcript(speaker: &str, text: &str) -> AgentEvent {
    AgentEvent::Transcript {
        speaker: Some(speaker.to_string()),
        text: text.to_string(),
    }
}

// ============================================================================
// Operational endpoints
// ============================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Request::get("/metrics").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Request::get("/v1/nonexistent").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Start assistant
// ============================================================================

#[tokio::test]
async fn test_start_assistant_success_message() {
    let app = TestApp::new();

    let (status, body) = app.start(json!({ "call_id": "standup-1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "message": "Meeting assistant started for call standup-1"
        })
    );

    app.agent.joined.notified().await;
    let joins = app.agent.joins();
    let (call_id, bot) = joins.first().unwrap();
    assert_eq!(call_id, "standup-1");
    assert_eq!(bot.user_id, "meeting-assistant-bot");
    assert_eq!(bot.name, "Meeting Assistant");
}

#[tokio::test]
async fn test_start_assistant_requires_call_id() {
    let app = TestApp::new();

    for body in [json!({}), json!({ "call_id": "" }), json!({ "call_id": null })] {
        let (status, body) = app.start(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "call_id is required");
    }

    assert!(app.agent.joins().is_empty());
}

#[tokio::test]
async fn test_start_assistant_rejects_malformed_json() {
    let app = TestApp::new();

    let request = Request::post("/start-assistant")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Status and transcript
// ============================================================================

#[tokio::test]
async fn test_unknown_call_status_and_transcript() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/status/unknown").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "not_found" }));

    let (status, body) = app.get_json("/transcript/unknown").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "transcript": [] }));
}

#[tokio::test]
async fn test_launched_call_is_inactive_until_session_starts() {
    let app = TestApp::new();
    app.launch("standup-1").await;

    let (_, body) = app.get_json("/status/standup-1").await;
    assert_eq!(
        body,
        json!({ "call_id": "standup-1", "is_active": false, "status": "inactive" })
    );

    app.agent.emit("standup-1", AgentEvent::SessionStarted).await;
    app.wait_for("/status/standup-1", |body| body["status"] == "active")
        .await;

    app.agent.emit("standup-1", AgentEvent::SessionEnded).await;
    let body = app
        .wait_for("/status/standup-1", |body| body["status"] == "inactive")
        .await;
    assert_eq!(body["is_active"], false);
}

#[tokio::test]
async fn test_transcript_collects_lines_and_answers_trigger() {
    let app = TestApp::new();
    app.launch("standup-1").await;

    app.agent
        .emit("standup-1", transcript("alice", "  The release moves to Friday "))
        .await;
    app.agent
        .emit("standup-1", transcript("bob", "Hey assistant when is the release?"))
        .await;

    let body = app
        .wait_for("/transcript/standup-1", |body| {
            body["transcript"].as_array().is_some_and(|lines| lines.len() == 2)
        })
        .await;
    assert_eq!(
        body,
        json!({
            "transcript": [
                { "speaker": "alice", "text": "The release moves to Friday" },
                { "speaker": "bob", "text": "Hey assistant when is the release?" }
            ]
        })
    );

    // The answer is requested before the line after it is processed
    app.agent
        .emit("standup-1", transcript("alice", "thanks"))
        .await;
    app.wait_for("/transcript/standup-1", |body| {
        body["transcript"].as_array().is_some_and(|lines| lines.len() == 3)
    })
    .await;

    let prompts = app.agent.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts
        .first()
        .unwrap()
        .contains("QUESTION:\nwhen is the release?"));
}

#[tokio::test]
async fn test_failed_launch_removes_record() {
    let app = TestApp::with_agent(ChannelAgent::failing_join("edge unreachable"));

    let (status, _) = app.start(json!({ "call_id": "standup-1" })).await;
    assert_eq!(status, StatusCode::OK);
    app.agent.joined.notified().await;

    app.wait_for("/status/standup-1", |body| body["status"] == "not_found")
        .await;
}

#[tokio::test]
async fn test_relaunch_replaces_record() {
    let app = TestApp::new();
    app.launch("standup-1").await;
    app.agent
        .emit("standup-1", transcript("alice", "first run"))
        .await;
    app.wait_for("/transcript/standup-1", |body| {
        body["transcript"].as_array().is_some_and(|lines| lines.len() == 1)
    })
    .await;

    app.launch("standup-1").await;

    let (_, body) = app.get_json("/transcript/standup-1").await;
    assert_eq!(body, json!({ "transcript": [] }));
    assert_eq!(app.agent.joins().len(), 2);
}

#[tokio::test]
async fn test_agent_finishing_keeps_record() {
    let app = TestApp::new();
    app.launch("standup-1").await;
    app.agent
        .emit("standup-1", transcript("alice", "wrap up"))
        .await;
    app.wait_for("/transcript/standup-1", |body| {
        body["transcript"].as_array().is_some_and(|lines| lines.len() == 1)
    })
    .await;

    app.agent.end("standup-1");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (_, body) = app.get_json("/transcript/standup-1").await;
    assert_eq!(body["transcript"].as_array().map(Vec::len), Some(1));
}
