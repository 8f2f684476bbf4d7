//! Integration tests for the Support Desk console.
//!
//! The tests under `tests/` run the console data layer against an
//! in-process mock of the backend REST API and against file-backed demo
//! stores in temporary directories. Nothing outside the test process is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p support-desk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - retry, auth and error handling of the HTTP client
//! - `chat_flow` - services and the query cache over both backends
//! - `demo_store` - persistence, export and import of the demo store

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use support_desk::api::{ApiClient, ApiError, ChatUpdate, OrderUpdate, RetryPolicy};
use support_desk::config::ApiConfig;
use support_desk::demo::{DemoSnapshot, seed_snapshot};
use support_desk_core::{
    Chat, ChatId, Message, Order, OrderId, Product, ProductId, SendMessage, Sender,
};

// =============================================================================
// Recorded State
// =============================================================================

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// Raw `Authorization` header, if sent.
    pub authorization: Option<String>,
    pub received_at: Instant,
}

#[derive(Debug)]
struct Failure {
    method: Method,
    path: String,
    status: StatusCode,
    remaining: u32,
}

#[derive(Debug)]
struct MockData {
    snapshot: DemoSnapshot,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<Failure>,
}

impl MockData {
    /// Consume one injected failure matching the request, if any.
    fn take_failure(&mut self, method: &Method, path: &str) -> Option<StatusCode> {
        let index = self
            .failures
            .iter()
            .position(|f| f.method == method && f.path == path)?;
        let failure = self.failures.get_mut(index)?;
        failure.remaining = failure.remaining.saturating_sub(1);
        let status = failure.status;
        if failure.remaining == 0 {
            self.failures.remove(index);
        }
        Some(status)
    }
}

/// Shared state of the mock backend.
#[derive(Clone)]
pub struct MockState {
    inner: Arc<Mutex<MockData>>,
}

impl MockState {
    fn new(snapshot: DemoSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockData {
                snapshot,
                requests: Vec::new(),
                failures: VecDeque::new(),
            })),
        }
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// Requests received for `method` on `path` (e.g. `/api/chats`).
    pub async fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.inner
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    /// Answer the next `times` requests for `method` on `path` with `status`.
    pub async fn fail_next(&self, method: Method, path: &str, status: StatusCode, times: u32) {
        self.inner.lock().await.failures.push_back(Failure {
            method,
            path: path.to_string(),
            status,
            remaining: times,
        });
    }

    /// Current backend data.
    pub async fn snapshot(&self) -> DemoSnapshot {
        self.inner.lock().await.snapshot.clone()
    }
}

// =============================================================================
// Server
// =============================================================================

/// In-process backend serving the REST API under `/api`.
///
/// Seeded with the demo data set. The server task is aborted on drop.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    handle: JoinHandle<std::io::Result<()>>,
}

impl MockBackend {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = MockState::new(seed_snapshot(Utc::now()));

        let api = Router::new()
            .route("/chats", get(list_chats))
            .route("/chats/{id}", get(get_chat).put(update_chat))
            .route("/messages", post(send_message))
            .route("/messages/{chat_id}", get(list_messages))
            .route("/products", get(list_products).post(create_product))
            .route("/products/{id}", put(update_product).delete(delete_product))
            .route("/orders", get(list_orders))
            .route("/orders/{id}", get(get_order).put(update_order));

        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &MockState {
        &self.state
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:4312/api`.
    ///
    /// # Panics
    ///
    /// Never; the address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("valid mock URL")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn api_config(&self, token: Option<&str>, retry: RetryPolicy) -> ApiConfig {
        ApiConfig {
            session_token: token.map(|t| SecretString::from(t.to_string())),
            timeout: Duration::from_secs(5),
            retry,
            ..ApiConfig::new(self.base_url())
        }
    }

    /// A client for this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self, token: Option<&str>, retry: RetryPolicy) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.api_config(token, retry))
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Retry policy with short delays so tests stay fast.
#[must_use]
pub const fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(500),
    }
}

// =============================================================================
// Middleware
// =============================================================================

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let failure = {
        let mut data = state.inner.lock().await;
        data.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization,
            received_at: Instant::now(),
        });
        data.take_failure(&method, &path)
    };

    match failure {
        Some(status) => error(status, "injected failure"),
        None => next.run(request).await,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_found(what: &str) -> Response {
    error(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_chats(State(state): State<MockState>) -> Json<Vec<Chat>> {
    let mut chats = state.inner.lock().await.snapshot.chats.clone();
    chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Json(chats)
}

async fn get_chat(State(state): State<MockState>, Path(id): Path<ChatId>) -> Response {
    let data = state.inner.lock().await;
    data.snapshot
        .chats
        .iter()
        .find(|c| c.id == id)
        .map_or_else(|| not_found("chat"), |c| Json(c.clone()).into_response())
}

async fn update_chat(
    State(state): State<MockState>,
    Path(id): Path<ChatId>,
    Json(update): Json<ChatUpdate>,
) -> Response {
    let mut data = state.inner.lock().await;
    let Some(chat) = data.snapshot.chats.iter_mut().find(|c| c.id == id) else {
        return not_found("chat");
    };
    if let Some(enabled) = update.ai_enabled {
        chat.ai_enabled = enabled;
    }
    if let Some(unread) = update.unread_count {
        chat.unread_count = unread;
    }
    Json(chat.clone()).into_response()
}

async fn list_messages(
    State(state): State<MockState>,
    Path(chat_id): Path<ChatId>,
) -> Json<Vec<Message>> {
    let data = state.inner.lock().await;
    // Newest first, so the client's ordering is exercised
    let mut messages: Vec<Message> = data
        .snapshot
        .messages
        .iter()
        .filter(|m| m.chat_id == chat_id)
        .cloned()
        .collect();
    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(messages)
}

async fn send_message(
    State(state): State<MockState>,
    Json(request): Json<SendMessage>,
) -> Response {
    let mut data = state.inner.lock().await;
    let now = Utc::now();
    let Some(chat) = data.snapshot.chats.iter_mut().find(|c| c.id == request.chat_id) else {
        return not_found("chat");
    };
    chat.updated_at = now;

    let mut message = Message::new(request.chat_id, Sender::User, request.content, now);
    message.product_id = request.product_id;
    data.snapshot.messages.push(message.clone());
    (StatusCode::CREATED, Json(message)).into_response()
}

async fn list_products(State(state): State<MockState>) -> Json<Vec<Product>> {
    Json(state.inner.lock().await.snapshot.products.clone())
}

async fn create_product(
    State(state): State<MockState>,
    Json(product): Json<Product>,
) -> Response {
    if product.name.trim().is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "name is required");
    }
    state.inner.lock().await.snapshot.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<MockState>,
    Path(id): Path<ProductId>,
    Json(product): Json<Product>,
) -> Response {
    let mut data = state.inner.lock().await;
    let Some(existing) = data.snapshot.products.iter_mut().find(|p| p.id == id) else {
        return not_found("product");
    };
    *existing = Product { id, ..product };
    Json(existing.clone()).into_response()
}

async fn delete_product(State(state): State<MockState>, Path(id): Path<ProductId>) -> Response {
    let mut data = state.inner.lock().await;
    let before = data.snapshot.products.len();
    data.snapshot.products.retain(|p| p.id != id);
    if data.snapshot.products.len() == before {
        not_found("product")
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn list_orders(State(state): State<MockState>) -> Json<Vec<Order>> {
    let mut orders = state.inner.lock().await.snapshot.orders.clone();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(orders)
}

async fn get_order(State(state): State<MockState>, Path(id): Path<OrderId>) -> Response {
    let data = state.inner.lock().await;
    data.snapshot
        .orders
        .iter()
        .find(|o| o.id == id)
        .map_or_else(|| not_found("order"), |o| Json(o.clone()).into_response())
}

async fn update_order(
    State(state): State<MockState>,
    Path(id): Path<OrderId>,
    Json(update): Json<OrderUpdate>,
) -> Response {
    let mut data = state.inner.lock().await;
    let Some(order) = data.snapshot.orders.iter_mut().find(|o| o.id == id) else {
        return not_found("order");
    };
    if let Some(status) = update.status {
        order.status = status;
    }
    if let Some(payment_status) = update.payment_status {
        order.payment_status = payment_status;
    }
    Json(order.clone()).into_response()
}
