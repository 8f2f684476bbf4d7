//! Seed data for a fresh demo store.
//!
//! IDs are fixed so that re-seeding yields the same entities; timestamps are
//! placed relative to the seeding time.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use support_desk_core::{
    Chat, ChatId, Message, MessageId, Order, OrderId, OrderItem, OrderStatus, PaymentStatus,
    Price, Product, ProductId, Sender,
};

use super::snapshot::{DemoSnapshot, SNAPSHOT_VERSION};

const fn id(n: u128) -> Uuid {
    Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0000 | n)
}

fn product(n: u128, name: &str, cents: u32, category: &str, quantity: u32) -> Product {
    Product {
        id: ProductId::new(id(0x100 + n)),
        name: name.to_string(),
        image_url: Some(format!("/images/products/{n}.jpg")),
        price: Price::from_cents(cents),
        category: category.to_string(),
        available: quantity > 0,
        quantity,
    }
}

fn chat(n: u128, name: &str, ai_enabled: bool, unread: u32, at: DateTime<Utc>) -> Chat {
    Chat {
        id: ChatId::new(id(0x200 + n)),
        name: name.to_string(),
        ai_enabled,
        unread_count: unread,
        customer_id: None,
        created_at: at - Duration::days(2),
        updated_at: at,
    }
}

fn message(n: u128, chat: &Chat, sender: Sender, content: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: MessageId::new(id(0x300 + n)),
        chat_id: chat.id,
        content: content.to_string(),
        sender,
        created_at: at,
        product_id: None,
    }
}

fn order(n: u128, customer: &str, items: Vec<OrderItem>, at: DateTime<Utc>) -> Order {
    let mut order = Order::new(customer, items, at);
    order.id = OrderId::new(id(0x400 + n));
    order
}

/// Build the initial demo data set.
#[must_use]
pub fn seed_snapshot(now: DateTime<Utc>) -> DemoSnapshot {
    let headphones = product(1, "Wireless Headphones", 5999, "Electronics", 24);
    let watch = product(2, "Smart Watch", 12_999, "Electronics", 3);
    let backpack = product(3, "Leather Backpack", 8_950, "Accessories", 12);
    let mug = product(4, "Ceramic Mug", 1_250, "Home", 40);
    let lamp = product(5, "Desk Lamp", 3_400, "Home", 0);

    let anna_at = now - Duration::minutes(5);
    let mark_at = now - Duration::hours(1);
    let lena_at = now - Duration::hours(20);
    let anna = chat(1, "Anna Smith", true, 1, anna_at);
    let mark = chat(2, "Mark Johnson", false, 2, mark_at);
    let lena = chat(3, "Lena Park", true, 0, lena_at);

    let messages = vec![
        message(1, &anna, Sender::User, "Hello! Do you have wireless headphones in stock?", anna_at - Duration::minutes(2)),
        Message {
            product_id: Some(headphones.id),
            ..message(2, &anna, Sender::Bot, "Hello! Yes, Wireless Headphones are in stock.", anna_at - Duration::minutes(1))
        },
        message(3, &anna, Sender::User, "Great, how much are they?", anna_at),
        message(4, &mark, Sender::User, "Where is my order?", mark_at - Duration::minutes(10)),
        message(5, &mark, Sender::User, "It was supposed to arrive yesterday.", mark_at),
        message(6, &lena, Sender::User, "Thanks for the quick delivery!", lena_at - Duration::minutes(1)),
        message(7, &lena, Sender::Bot, "You're welcome! Enjoy your purchase.", lena_at),
    ];

    let mut paid = order(
        1,
        "Lena Park",
        vec![
            OrderItem::from_product(&backpack, 1),
            OrderItem::from_product(&mug, 2),
        ],
        now - Duration::days(3),
    );
    paid.status = OrderStatus::Completed;
    paid.payment_status = PaymentStatus::Paid;

    let mut processing = order(
        2,
        "Mark Johnson",
        vec![OrderItem::from_product(&watch, 1)],
        now - Duration::days(2),
    );
    processing.status = OrderStatus::Processing;
    processing.payment_status = PaymentStatus::Paid;

    let fresh = order(
        3,
        "Anna Smith",
        vec![OrderItem::from_product(&headphones, 1)],
        now - Duration::hours(2),
    );

    DemoSnapshot {
        version: SNAPSHOT_VERSION,
        demo_mode: true,
        chats: vec![anna, mark, lena],
        messages,
        products: vec![headphones, watch, backpack, mug, lamp],
        orders: vec![paid, processing, fresh],
    }
}
