//! End-to-end relay behaviour: HTTP request in, acknowledgment out, one
//! callback POST delivered to a local receiver.

use std::sync::Arc;

use ar_domain::assistant::{
    MessageContent, MessageRole, Run, RunError, RunStatus, TextContent, Thread, ThreadMessage,
};
use ar_domain::config::Config;
use ar_domain::error::{Error, Result};
use ar_gateway::runtime::callback::DeliveryOutcome;
use ar_gateway::runtime::notifier::complete_run;
use ar_gateway::runtime::RelayJob;
use ar_gateway::{api, AppState};
use ar_providers::AssistantProvider;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fake provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const NEW_THREAD: &str = "thread_new";

struct FakeAssistants {
    known_threads: Vec<String>,
    /// Status of the newest existing run on every known thread.
    latest_run: Option<RunStatus>,
    /// Status reported by the first retrieve after creation.
    terminal: RunStatus,
    reply: Option<String>,
    create_run_fault: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeAssistants {
    fn new() -> Self {
        Self {
            known_threads: vec![NEW_THREAD.into(), "thread_existing".into()],
            latest_run: None,
            terminal: RunStatus::Completed,
            reply: Some("Hello!".into()),
            create_run_fault: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_owned());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn check_thread(&self, thread_id: &str) -> Result<()> {
        if self.known_threads.iter().any(|t| t == thread_id) {
            Ok(())
        } else {
            Err(Error::NotFound {
                resource: "thread".into(),
                message: format!("No thread found with id '{thread_id}'."),
            })
        }
    }

    fn run(&self, thread_id: &str, status: RunStatus) -> Run {
        let last_error = (status == RunStatus::Failed).then(|| RunError {
            code: "server_error".into(),
            message: "Sorry, something went wrong.".into(),
        });
        Run {
            id: "run_1".into(),
            thread_id: thread_id.into(),
            assistant_id: Some("asst_1".into()),
            status,
            last_error,
        }
    }
}

#[async_trait::async_trait]
impl AssistantProvider for FakeAssistants {
    async fn create_thread(&self) -> Result<Thread> {
        self.record("create_thread");
        Ok(Thread {
            id: NEW_THREAD.into(),
            created_at: Some(1_700_000_000),
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        self.record("create_message");
        self.check_thread(thread_id)?;
        Ok(ThreadMessage {
            id: "msg_user".into(),
            thread_id: thread_id.into(),
            role,
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: content.into(),
                },
            }],
        })
    }

    async fn create_run(&self, thread_id: &str, _assistant_id: &str) -> Result<Run> {
        self.record("create_run");
        if let Some(fault) = &self.create_run_fault {
            return Err(Error::Provider {
                provider: "fake".into(),
                status: Some(429),
                message: fault.clone(),
            });
        }
        Ok(self.run(thread_id, RunStatus::Queued))
    }

    async fn retrieve_run(&self, thread_id: &str, _run_id: &str) -> Result<Run> {
        self.record("retrieve_run");
        Ok(self.run(thread_id, self.terminal.clone()))
    }

    async fn cancel_run(&self, thread_id: &str, _run_id: &str) -> Result<Run> {
        self.record("cancel_run");
        Ok(self.run(thread_id, RunStatus::Cancelling))
    }

    async fn list_runs(&self, thread_id: &str, _limit: u32) -> Result<Vec<Run>> {
        self.record("list_runs");
        self.check_thread(thread_id)?;
        Ok(self
            .latest_run
            .clone()
            .map(|s| vec![self.run(thread_id, s)])
            .unwrap_or_default())
    }

    async fn list_messages(&self, thread_id: &str, _limit: u32) -> Result<Vec<ThreadMessage>> {
        self.record("list_messages");
        let content = match &self.reply {
            Some(text) => vec![MessageContent::Text {
                text: TextContent {
                    value: text.clone(),
                },
            }],
            None => vec![MessageContent::Other],
        };
        Ok(vec![ThreadMessage {
            id: "msg_reply".into(),
            thread_id: thread_id.into(),
            role: MessageRole::Assistant,
            content,
        }])
    }

    fn provider_id(&self) -> &str {
        "fake"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Harness {
    state: AppState,
    fake: Arc<FakeAssistants>,
    receiver: MockServer,
}

impl Harness {
    async fn new(fake: FakeAssistants) -> Self {
        let receiver = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cb"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&receiver)
            .await;

        let mut config = Config::default();
        config.assistants.poll_interval_ms = 1;
        config.assistants.run_timeout_secs = 5;

        let fake = Arc::new(fake);
        let state = AppState::new(Arc::new(config), fake.clone()).unwrap();
        Self {
            state,
            fake,
            receiver,
        }
    }

    fn callback_url(&self) -> String {
        format!("{}/cb", self.receiver.uri())
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let app = api::router().with_state(self.state.clone());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Register a relay on the new thread that reports to `callback_url`.
    fn job(&self, callback_url: String) -> RelayJob {
        let relay_id = Uuid::new_v4();
        self.state.relays.register(relay_id, NEW_THREAD, "asst_1");
        RelayJob {
            relay_id,
            thread_id: NEW_THREAD.into(),
            assistant_id: "asst_1".into(),
            callback_url,
            passthrough: Map::new(),
        }
    }

    /// Wait for every spawned notifier, then return the callback bodies.
    async fn callbacks(&self) -> Vec<Value> {
        self.state.background.close();
        self.state.background.wait().await;
        self.receiver
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn completed_run_calls_back_with_the_reply() {
    let h = Harness::new(FakeAssistants::new()).await;

    let (status, ack) = h
        .post(
            "/threads",
            json!({
                "question": "hi",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ack,
        json!({ "status": "processing", "message": "Run started", "thread_id": NEW_THREAD })
    );

    let callbacks = h.callbacks().await;
    assert_eq!(callbacks.len(), 1);
    assert_eq!(
        callbacks[0],
        json!({ "status": "success", "message": "Hello!", "thread_id": NEW_THREAD })
    );
    assert_eq!(h.state.relays.in_flight(), 0);
}

#[tokio::test]
async fn failed_run_reports_its_status() {
    let mut fake = FakeAssistants::new();
    fake.terminal = RunStatus::Failed;
    let h = Harness::new(fake).await;

    let (status, _) = h
        .post(
            "/threads",
            json!({
                "question": "hi",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url(),
                "thread_id": "thread_existing"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let callbacks = h.callbacks().await;
    assert_eq!(callbacks.len(), 1);
    assert_eq!(
        callbacks[0],
        json!({
            "status": "error",
            "message": "Run failed with status: failed",
            "thread_id": "thread_existing"
        })
    );
}

#[tokio::test]
async fn provider_fault_message_is_extracted() {
    let mut fake = FakeAssistants::new();
    fake.create_run_fault =
        Some(r#"Error code: 429 - {'error': {'message': "rate limited", 'type': 'requests'}}"#.into());
    let h = Harness::new(fake).await;

    h.post(
        "/threads",
        json!({
            "question": "hi",
            "assistant_id": "asst_1",
            "callback_url": h.callback_url()
        }),
    )
    .await;

    let callbacks = h.callbacks().await;
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["status"], "error");
    assert_eq!(callbacks[0]["message"], "rate limited");
    assert_eq!(callbacks[0]["thread_id"], NEW_THREAD);
}

#[tokio::test]
async fn completed_without_text_is_an_error_callback() {
    let mut fake = FakeAssistants::new();
    fake.reply = None;
    let h = Harness::new(fake).await;

    h.post(
        "/threads",
        json!({
            "question": "draw me a cat",
            "assistant_id": "asst_1",
            "callback_url": h.callback_url()
        }),
    )
    .await;

    let callbacks = h.callbacks().await;
    assert_eq!(callbacks[0]["status"], "error");
    assert_eq!(callbacks[0]["message"], "Run completed without a text reply");
}

#[tokio::test]
async fn active_run_is_rejected_without_writes() {
    let mut fake = FakeAssistants::new();
    fake.latest_run = Some(RunStatus::InProgress);
    let h = Harness::new(fake).await;

    let (status, body) = h
        .post(
            "/threads",
            json!({
                "question": "hi",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url(),
                "thread_id": "thread_existing"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "There is an active run on this thread (status: in_progress). Please wait for it to complete.",
            "thread_id": "thread_existing"
        })
    );
    assert!(h.callbacks().await.is_empty());
    assert_eq!(h.fake.calls(), vec!["list_runs".to_string()]);
}

#[tokio::test]
async fn finished_previous_run_does_not_block() {
    let mut fake = FakeAssistants::new();
    fake.latest_run = Some(RunStatus::Completed);
    let h = Harness::new(fake).await;

    let (status, ack) = h
        .post(
            "/threads",
            json!({
                "question": "and again",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url(),
                "thread_id": "thread_existing"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["thread_id"], "thread_existing");
    assert_eq!(h.callbacks().await.len(), 1);
}

#[tokio::test]
async fn unknown_thread_is_rejected() {
    let h = Harness::new(FakeAssistants::new()).await;

    let (status, body) = h
        .post(
            "/threads",
            json!({
                "question": "hi",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url(),
                "thread_id": "thread_missing"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "Invalid thread ID provided thread_missing",
            "thread_id": "thread_missing"
        })
    );
    assert!(h.callbacks().await.is_empty());
    assert!(!h.fake.calls().contains(&"create_message".to_string()));
}

#[tokio::test]
async fn passthrough_fields_reach_the_callback_only() {
    let h = Harness::new(FakeAssistants::new()).await;

    let (_, ack) = h
        .post(
            "/v1/threads",
            json!({
                "question": "hi",
                "assistant_id": "asst_1",
                "callback_url": h.callback_url(),
                "contact_id": 42,
                "status": "spoofed"
            }),
        )
        .await;

    assert!(ack.get("contact_id").is_none());

    let callbacks = h.callbacks().await;
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["contact_id"], 42);
    assert_eq!(callbacks[0]["status"], "success");
}

#[tokio::test]
async fn missing_fields_are_rejected_synchronously() {
    let h = Harness::new(FakeAssistants::new()).await;

    let (status, body) = h
        .post(
            "/threads",
            json!({ "assistant_id": "asst_1", "callback_url": h.callback_url() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "status": "error", "message": "question is required" })
    );

    let (status, body) = h
        .post(
            "/threads",
            json!({ "question": "hi", "assistant_id": "asst_1", "callback_url": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    assert!(h.fake.calls().is_empty());
    assert!(h.callbacks().await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let h = Harness::new(FakeAssistants::new()).await;

    let (status, body) = h.post_raw("/threads", "{not json".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(h.fake.calls().is_empty());
}

#[tokio::test]
async fn health_reports_provider() {
    let h = Harness::new(FakeAssistants::new()).await;
    let app = api::router().with_state(h.state.clone());

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "provider": "fake", "in_flight": 0 }));
}

#[tokio::test]
async fn rejected_callback_is_attempted_once() {
    let h = Harness::new(FakeAssistants::new()).await;
    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.receiver)
        .await;

    let job = h.job(format!("{}/broken", h.receiver.uri()));
    let outcome = complete_run(&h.state, job).await;

    assert_eq!(outcome, DeliveryOutcome::Rejected { status: 500 });
    let posts = h.receiver.received_requests().await.unwrap_or_default();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url.path(), "/broken");
    assert_eq!(h.state.relays.in_flight(), 0);
}

#[tokio::test]
async fn unreachable_callback_is_logged_and_dropped() {
    let h = Harness::new(FakeAssistants::new()).await;

    let job = h.job("http://127.0.0.1:1/cb".into());
    let outcome = complete_run(&h.state, job).await;

    assert!(matches!(outcome, DeliveryOutcome::Failed { .. }), "{outcome:?}");
    assert!(h.receiver.received_requests().await.unwrap_or_default().is_empty());
    assert_eq!(h.state.relays.in_flight(), 0);
    // The run itself still went through once.
    assert_eq!(
        h.fake.calls().iter().filter(|c| *c == "create_run").count(),
        1
    );
}
