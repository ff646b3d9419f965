use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use sumki_core::ProductKind;
use sumki_order::{Identity, StepInput, WizardStep};
use sumki_submission::{
    DeliveryMode, HttpRelay, OrderSession, RelayBridge, RelayConfig, SubmissionConfig,
};

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<Value>>>,
    replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
}

async fn send(State(state): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(body);
    let reply = state.replies.lock().unwrap().pop_front();
    match reply {
        Some((status, body)) => (status, Json(body)),
        None => (StatusCode::OK, Json(json!({ "ok": true }))),
    }
}

struct TestRelay {
    endpoint: String,
    state: Recorded,
    handle: tokio::task::JoinHandle<()>,
}

impl TestRelay {
    /// Relay answering with `replies` in order, then `{"ok": true}`.
    async fn spawn(replies: Vec<(StatusCode, Value)>) -> Self {
        let state = Recorded::default();
        state.replies.lock().unwrap().extend(replies);

        let app = Router::new()
            .route("/send", post(send))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}/send", addr),
            state,
            handle,
        }
    }

    fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    fn bridge(&self, max_retries: u32) -> Arc<RelayBridge> {
        self.bridge_with_delay(max_retries, Duration::from_millis(5))
    }

    fn bridge_with_delay(&self, max_retries: u32, retry_delay: Duration) -> Arc<RelayBridge> {
        let mut config = RelayConfig::new(self.endpoint.clone(), "50122963");
        config.max_retries = max_retries;
        config.retry_delay = retry_delay;
        config.request_timeout = Duration::from_secs(5);
        let relay = HttpRelay::new(config).unwrap();
        Arc::new(
            RelayBridge::new(relay).with_identity(Identity::new(42, "Anna").with_username("anna")),
        )
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn rejected(description: &str) -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        json!({ "ok": false, "description": description }),
    )
}

fn server_error() -> (StatusCode, Value) {
    (StatusCode::INTERNAL_SERVER_ERROR, json!({ "ok": false }))
}

fn accepted() -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "ok": true }))
}

async fn custom_session(bridge: Arc<RelayBridge>, config: &SubmissionConfig) -> OrderSession {
    let mut session = OrderSession::start(bridge, config);
    session
        .advance(StepInput::Product {
            product: Some(ProductKind::Custom),
        })
        .unwrap();
    session
        .advance(StepInput::Custom {
            description: Some("бархат ".repeat(700)),
        })
        .unwrap();
    session
}

async fn bag_session(bridge: Arc<RelayBridge>) -> OrderSession {
    let mut session = OrderSession::start(bridge, &SubmissionConfig::default());
    let inputs = [
        StepInput::Product {
            product: Some(ProductKind::Bag),
        },
        StepInput::Bag {
            size: Some("M".into()),
            shape: Some("round".into()),
            material: Some("acrylic".into()),
        },
        StepInput::Color {
            color: Some("pink".into()),
            preference: None,
        },
        StepInput::Options {
            options: Some(vec!["clasp".into()]),
        },
    ];
    for input in inputs {
        session.advance(input).unwrap();
    }
    session
}

#[tokio::test]
async fn order_is_posted_as_plain_text() {
    let server = TestRelay::spawn(vec![]).await;
    let bridge = server.bridge(0);
    let mut session = bag_session(bridge.clone()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(body["chat_id"], "50122963");
    assert_eq!(body["product"], "bag");
    assert_eq!(body["options"], json!(["clasp"]));
    assert_eq!(body["user"]["id"], 42);
    assert!(body.get("parse_mode").is_none());
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("- Продукт: Сумка"));
    assert!(text.contains("  • Застежка"));
    assert!(text.contains("- Username: @anna"));
    assert_eq!(bridge.last_delivery(), Some(DeliveryMode::Plain));
}

#[tokio::test]
async fn rejected_plain_text_falls_back_to_markdown() {
    let server = TestRelay::spawn(vec![rejected("Bad Request: can't parse entities")]).await;
    let bridge = server.bridge(0);
    let mut session = bag_session(bridge.clone()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1]["parse_mode"], "MarkdownV2");
    let escaped = requests[1]["text"].as_str().unwrap();
    assert!(escaped.contains(r"\*Детали заказа:\*"));
    assert!(escaped.contains(r"\- Размер: M"));
    assert_eq!(bridge.last_delivery(), Some(DeliveryMode::MarkdownV2));
}

#[tokio::test]
async fn basic_notice_is_the_last_resort() {
    let server = TestRelay::spawn(vec![rejected("plain"), rejected("markdown")]).await;
    let bridge = server.bridge(0);
    let mut session = bag_session(bridge.clone()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[2].get("parse_mode").is_none());
    assert_eq!(
        requests[2]["text"],
        "Новый заказ!\n\nОт: Anna (@anna)\n\nПожалуйста, проверьте логи."
    );
    assert_eq!(bridge.last_delivery(), Some(DeliveryMode::BasicNotice));
}

#[tokio::test]
async fn server_errors_are_retried_with_backoff() {
    let server = TestRelay::spawn(vec![server_error(), server_error()]).await;
    let bridge = server.bridge(3);
    let mut session = bag_session(bridge.clone()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.get("parse_mode").is_none()));
    assert_eq!(requests[0], requests[2]);
    assert_eq!(bridge.last_delivery(), Some(DeliveryMode::Plain));
}

#[tokio::test]
async fn exhausted_relay_leaves_a_retryable_error() {
    let server = TestRelay::spawn(vec![server_error(), server_error(), server_error()]).await;
    let bridge = server.bridge(0);
    let mut session = bag_session(bridge.clone()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Error);
    let failure = session.wizard().failure().unwrap().clone();
    assert!(failure.retryable);
    assert!(failure.reason.contains("500"));
    assert_eq!(server.requests().len(), 3);
    assert_eq!(bridge.last_delivery(), None);

    // The relay has recovered: the same draft goes through on retry.
    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);
    assert_eq!(server.requests().len(), 4);
}

#[tokio::test]
async fn long_orders_are_split_into_chunks() {
    let server = TestRelay::spawn(vec![]).await;
    let bridge = server.bridge(0);
    let mut session = custom_session(bridge, &SubmissionConfig::default()).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    // Header lines, then the oversized description line cut at the limit,
    // then its tail with the client block.
    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    let texts: Vec<&str> = requests.iter().map(|r| r["text"].as_str().unwrap()).collect();
    assert!(texts.iter().all(|t| t.chars().count() <= 4000));
    assert!(texts[0].starts_with("🛍️ *Новый заказ из мини-приложения*"));
    assert_eq!(texts.concat(), session.seller_message());
}

#[tokio::test]
async fn retry_after_timeout_resumes_at_the_undelivered_chunk() {
    // First chunk lands, the second hits two 500s and the gateway gives up
    // during the second backoff sleep.
    let server = TestRelay::spawn(vec![accepted(), server_error(), server_error()]).await;
    let bridge = server.bridge_with_delay(3, Duration::from_millis(300));
    let config = SubmissionConfig {
        send_timeout: Some(Duration::from_millis(500)),
        relay: None,
    };
    let mut session = custom_session(bridge.clone(), &config).await;

    assert_eq!(session.submit().await.unwrap(), WizardStep::Error);
    let failure = session.wizard().failure().unwrap();
    assert_eq!(failure.reason, "timeout");
    assert!(failure.retryable);
    assert_eq!(server.requests().len(), 3);

    assert_eq!(session.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 5);
    let texts: Vec<&str> = requests.iter().map(|r| r["text"].as_str().unwrap()).collect();
    let headers = texts
        .iter()
        .filter(|t| t.starts_with("🛍️ *Новый заказ из мини-приложения*"))
        .count();
    assert_eq!(headers, 1);
    assert_eq!(texts[1], texts[2]);
    assert_eq!(texts[2], texts[3]);
    assert_eq!(
        [texts[0], texts[3], texts[4]].concat(),
        session.seller_message()
    );
    assert_eq!(bridge.last_delivery(), Some(DeliveryMode::Plain));
}

#[tokio::test]
async fn completed_delivery_does_not_skip_on_the_next_order() {
    let server = TestRelay::spawn(vec![]).await;
    let bridge = server.bridge(0);

    let mut first = custom_session(bridge.clone(), &SubmissionConfig::default()).await;
    assert_eq!(first.submit().await.unwrap(), WizardStep::Success);
    let mut second = custom_session(bridge, &SubmissionConfig::default()).await;
    assert_eq!(second.submit().await.unwrap(), WizardStep::Success);

    let requests = server.requests();
    assert_eq!(requests.len(), 6);
    assert_eq!(requests[0], requests[3]);
}
