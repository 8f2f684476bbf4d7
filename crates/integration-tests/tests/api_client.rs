//! HTTP client behavior against the mock backend.

use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use tokio_util::sync::CancellationToken;

use support_desk::api::{ApiError, ChatUpdate, OrderUpdate, RequestOptions, RetryPolicy};
use support_desk_core::{Chat, OrderStatus, PaymentStatus, Price, Product, SendMessage};
use support_desk_integration_tests::{MockBackend, fast_retry};

async fn backend() -> MockBackend {
    MockBackend::start().await.expect("mock backend")
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_get_succeeds_after_two_transient_failures() {
    let mock = backend().await;
    let client = mock.client(Some("token"), fast_retry()).expect("client");
    mock.state()
        .fail_next(Method::GET, "/api/chats", StatusCode::SERVICE_UNAVAILABLE, 2)
        .await;

    let chats = client.list_chats().await.expect("chats after retries");
    assert_eq!(chats.len(), 3);

    let requests = mock.state().requests_to(&Method::GET, "/api/chats").await;
    assert_eq!(requests.len(), 3);

    // 50ms then 100ms of backoff between the three attempts
    let first = requests.first().expect("first").received_at;
    let last = requests.last().expect("last").received_at;
    let elapsed = last.duration_since(first);
    assert!(elapsed >= Duration::from_millis(150), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(150 + 1000), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_get_gives_up_after_max_retries() {
    let mock = backend().await;
    let client = mock.client(Some("token"), fast_retry()).expect("client");
    mock.state()
        .fail_next(Method::GET, "/api/products", StatusCode::BAD_GATEWAY, 5)
        .await;

    let err = client.list_products().await.expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    assert_eq!(
        mock.state()
            .requests_to(&Method::GET, "/api/products")
            .await
            .len(),
        3
    );
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock = backend().await;
    let client = mock.client(Some("token"), fast_retry()).expect("client");
    mock.state()
        .fail_next(Method::GET, "/api/orders", StatusCode::BAD_REQUEST, 1)
        .await;

    let err = client.list_orders().await.expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(!err.is_transient());
    assert_eq!(
        mock.state().requests_to(&Method::GET, "/api/orders").await.len(),
        1
    );
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let mock = backend().await;
    let client = mock.client(Some("token"), fast_retry()).expect("client");
    let chat = client.list_chats().await.expect("chats").remove(0);
    mock.state()
        .fail_next(Method::POST, "/api/messages", StatusCode::SERVICE_UNAVAILABLE, 1)
        .await;

    let request = SendMessage {
        chat_id: chat.id,
        content: "hello".to_string(),
        product_id: None,
    };
    let err = client.send_message(&request).await.expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(
        mock.state()
            .requests_to(&Method::POST, "/api/messages")
            .await
            .len(),
        1
    );
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_bearer_token_attached_when_configured() {
    let mock = backend().await;
    let client = mock.client(Some("secret-session"), RetryPolicy::none()).expect("client");
    client.list_chats().await.expect("chats");

    let requests = mock.state().requests().await;
    let auth = requests.first().and_then(|r| r.authorization.clone());
    assert_eq!(auth.as_deref(), Some("Bearer secret-session"));
}

#[tokio::test]
async fn test_no_auth_header_without_token() {
    let mock = backend().await;
    let client = mock.client(None, RetryPolicy::none()).expect("client");
    client.list_chats().await.expect("chats");

    let requests = mock.state().requests().await;
    assert!(requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn test_no_auth_header_when_not_required() {
    let mock = backend().await;
    let client = mock.client(Some("secret-session"), RetryPolicy::none()).expect("client");
    let _: Vec<Chat> = client
        .get("/chats", &RequestOptions::default())
        .await
        .expect("chats");

    let requests = mock.state().requests().await;
    assert!(requests.iter().all(|r| r.authorization.is_none()));
}

// =============================================================================
// Errors and Cancellation
// =============================================================================

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let mock = backend().await;
    let client = mock.client(Some("token"), RetryPolicy::none()).expect("client");
    let product = Product::new("   ", Price::ZERO, "Misc");

    let err = client.create_product(&product).await.expect_err("rejected");
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(message, "name is required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_resource_is_not_found() {
    let mock = backend().await;
    let client = mock.client(Some("token"), RetryPolicy::none()).expect("client");
    let product = Product::new("Ghost", Price::ZERO, "Misc");

    let err = client.delete_product(product.id).await.expect_err("missing");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cancelled_token_aborts_request() {
    let mock = backend().await;
    let client = mock.client(Some("token"), fast_retry()).expect("client");
    let token = CancellationToken::new();
    token.cancel();

    let options = RequestOptions::authenticated().with_cancel(token);
    let result: Result<Vec<Chat>, ApiError> = client.get("/chats", &options).await;
    assert!(matches!(result, Err(ApiError::Cancelled)));
}

#[tokio::test]
async fn test_cancel_interrupts_backoff() {
    let mock = backend().await;
    let slow = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_secs(10),
        max_delay: Duration::from_secs(10),
    };
    let client = mock.client(Some("token"), slow).expect("client");
    mock.state()
        .fail_next(Method::GET, "/api/chats", StatusCode::SERVICE_UNAVAILABLE, 1)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let options = RequestOptions::authenticated().with_cancel(token);
    let result: Result<Vec<Chat>, ApiError> = client.get("/chats", &options).await;
    assert!(matches!(result, Err(ApiError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

// =============================================================================
// Typed Endpoints
// =============================================================================

#[tokio::test]
async fn test_messages_are_returned_oldest_first() {
    let mock = backend().await;
    let client = mock.client(Some("token"), RetryPolicy::none()).expect("client");
    let chat = client.list_chats().await.expect("chats").remove(0);

    let messages = client.list_messages(chat.id).await.expect("messages");
    assert!(!messages.is_empty());
    assert!(messages.is_sorted_by_key(|m| m.created_at));
}

#[tokio::test]
async fn test_chat_update_round_trip() {
    let mock = backend().await;
    let client = mock.client(Some("token"), RetryPolicy::none()).expect("client");
    let chat = client
        .list_chats()
        .await
        .expect("chats")
        .into_iter()
        .find(|c| c.unread_count > 0)
        .expect("unread chat");

    let updated = client
        .update_chat(chat.id, &ChatUpdate::mark_read())
        .await
        .expect("update");
    assert_eq!(updated.unread_count, 0);
    assert_eq!(updated.ai_enabled, chat.ai_enabled);

    let fetched = client.get_chat(chat.id).await.expect("chat");
    assert_eq!(fetched.unread_count, 0);
}

#[tokio::test]
async fn test_order_update_round_trip() {
    let mock = backend().await;
    let client = mock.client(Some("token"), RetryPolicy::none()).expect("client");
    let order = client.list_orders().await.expect("orders").remove(0);

    let update = OrderUpdate {
        status: Some(OrderStatus::Completed),
        payment_status: Some(PaymentStatus::Paid),
    };
    let updated = client.update_order(order.id, &update).await.expect("update");
    assert_eq!(updated.status, OrderStatus::Completed);
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.total_amount, order.total_amount);
}
