//! End-to-end flows through `AppContext` over both backends.

use std::time::Duration;

use axum::http::Method;
use tokio::sync::broadcast;

use support_desk::query::{QueryEvent, QueryKey, keys};
use support_desk::{AppContext, ConsoleConfig};
use support_desk_core::{Chat, OrderStatus, PaymentStatus, Price, Product, Sender};
use support_desk_integration_tests::{MockBackend, fast_retry};

fn base_config() -> ConsoleConfig {
    ConsoleConfig::from_lookup(|_| None).expect("config")
}

fn demo_context(dir: &std::path::Path) -> AppContext {
    let mut config = base_config();
    config.demo.enabled = true;
    config.demo.data_dir = dir.to_path_buf();
    config.demo.reply_delay = Duration::from_millis(30);
    AppContext::new(config).expect("demo context")
}

fn remote_context(mock: &MockBackend) -> AppContext {
    let mut config = base_config();
    config.api = mock.api_config(Some("session"), fast_retry());
    AppContext::new(config).expect("remote context")
}

async fn find_chat(ctx: &AppContext, ai_enabled: bool) -> Chat {
    ctx.chats()
        .list_chats()
        .await
        .expect("chats")
        .into_iter()
        .find(|c| c.ai_enabled == ai_enabled)
        .expect("chat")
}

/// Wait until `key` has been invalidated `times` times.
async fn expect_invalidations(rx: &mut broadcast::Receiver<QueryEvent>, key: &QueryKey, times: usize) {
    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while seen < times {
            match rx.recv().await {
                Ok(QueryEvent::Invalidated(k)) if &k == key => seen += 1,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await
    .expect("invalidation events");
    assert_eq!(seen, times);
}

// =============================================================================
// Demo Backend
// =============================================================================

#[tokio::test]
async fn test_demo_ai_reply_refreshes_messages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = demo_context(dir.path());
    let chat = find_chat(&ctx, true).await;
    let before = ctx.chats().messages(chat.id).await.expect("messages");
    let mut events = ctx.queries().subscribe();

    let sent = ctx
        .chats()
        .send_message(chat.id, "Do you have any headphones?", None)
        .await
        .expect("send");
    let reply = sent.wait_reply().await.expect("assistant reply");
    assert_eq!(reply.sender, Sender::Bot);

    // Once for the send, once for the stored reply
    expect_invalidations(&mut events, &keys::messages(chat.id), 2).await;

    let after = ctx.chats().messages(chat.id).await.expect("messages");
    assert_eq!(after.len(), before.len() + 2);
    assert_eq!(after.last().map(|m| m.id), Some(reply.id));
    let bots = after.iter().filter(|m| m.sender == Sender::Bot).count();
    let bots_before = before.iter().filter(|m| m.sender == Sender::Bot).count();
    assert_eq!(bots, bots_before + 1);
}

#[tokio::test]
async fn test_demo_manual_chat_counts_unread() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = demo_context(dir.path());
    let chat = find_chat(&ctx, false).await;

    let sent = ctx
        .chats()
        .send_message(chat.id, "Is anyone there?", None)
        .await
        .expect("send");
    assert!(sent.reply.is_none());

    let refreshed = ctx.chats().get_chat(chat.id).await.expect("chat");
    assert_eq!(refreshed.unread_count, chat.unread_count + 1);

    let read = ctx.chats().mark_read(chat.id).await.expect("read");
    assert_eq!(read.unread_count, 0);
}

#[tokio::test]
async fn test_demo_dashboard_follows_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = demo_context(dir.path());
    let before = ctx.analytics().dashboard().await.expect("stats");

    let product = Product::new("Clearance Socks", Price::from_cents(499), "Apparel").with_quantity(1);
    ctx.catalog().create(product).await.expect("create");

    let after = ctx.analytics().dashboard().await.expect("stats");
    assert_eq!(after.product_count, before.product_count + 1);
    assert_eq!(after.low_stock_products, before.low_stock_products + 1);
}

#[tokio::test]
async fn test_demo_state_survives_new_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chat_id = {
        let ctx = demo_context(dir.path());
        let chat = find_chat(&ctx, false).await;
        ctx.chats()
            .set_ai_enabled(chat.id, true)
            .await
            .expect("toggle");
        ctx.shutdown();
        chat.id
    };

    let ctx = demo_context(dir.path());
    let chat = ctx.chats().get_chat(chat_id).await.expect("chat");
    assert!(chat.ai_enabled);
}

// =============================================================================
// Remote Backend
// =============================================================================

#[tokio::test]
async fn test_remote_queries_are_cached_until_invalidated() {
    let mock = MockBackend::start().await.expect("mock backend");
    let ctx = remote_context(&mock);

    let chats = ctx.chats().list_chats().await.expect("chats");
    ctx.chats().list_chats().await.expect("cached chats");
    assert_eq!(
        mock.state().requests_to(&Method::GET, "/api/chats").await.len(),
        1
    );

    let chat = chats.first().expect("chat");
    ctx.chats()
        .set_ai_enabled(chat.id, !chat.ai_enabled)
        .await
        .expect("toggle");

    let refreshed = ctx.chats().list_chats().await.expect("chats");
    assert_eq!(
        mock.state().requests_to(&Method::GET, "/api/chats").await.len(),
        2
    );
    let toggled = refreshed.iter().find(|c| c.id == chat.id).expect("chat");
    assert_eq!(toggled.ai_enabled, !chat.ai_enabled);
}

#[tokio::test]
async fn test_remote_send_has_no_simulated_reply() {
    let mock = MockBackend::start().await.expect("mock backend");
    let ctx = remote_context(&mock);
    let chat = find_chat(&ctx, true).await;

    let sent = ctx
        .chats()
        .send_message(chat.id, "  hello from the console  ", None)
        .await
        .expect("send");
    assert!(sent.reply.is_none());
    assert_eq!(sent.message.content, "hello from the console");

    let stored = mock.state().snapshot().await;
    assert!(stored.messages.iter().any(|m| m.id == sent.message.id));

    let requests = mock.state().requests_to(&Method::POST, "/api/messages").await;
    assert_eq!(
        requests.first().and_then(|r| r.authorization.as_deref()),
        Some("Bearer session")
    );
}

#[tokio::test]
async fn test_remote_catalog_and_orders() {
    let mock = MockBackend::start().await.expect("mock backend");
    let ctx = remote_context(&mock);

    let product = Product::new("Canvas Tote", Price::from_cents(2500), "Bags").with_quantity(8);
    let created = ctx.catalog().create(product.clone()).await.expect("create");
    assert_eq!(created, product);
    assert!(ctx.catalog().delete(product.id).await.expect("delete"));
    assert!(!ctx.catalog().delete(product.id).await.expect("second delete"));

    let order = ctx.orders().list().await.expect("orders").remove(0);
    let updated = ctx
        .orders()
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .expect("status");
    assert_eq!(updated.status, OrderStatus::Cancelled);

    let updated = ctx
        .orders()
        .update_payment_status(order.id, PaymentStatus::Refunded)
        .await
        .expect("payment");
    assert_eq!(updated.payment_status, PaymentStatus::Refunded);

    let stats = ctx.analytics().dashboard().await.expect("stats");
    assert_eq!(stats.chat_count, 3);
    assert!(stats.orders.cancelled >= 1);
}
