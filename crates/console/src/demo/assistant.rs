//! Simulated AI assistant for demo mode.
//!
//! Replies are picked from canned responses by keyword and appended to the
//! chat after a delay, as a real assistant backend would.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use support_desk_core::{ChatId, Message, Product, ProductId, Sender};

use super::DemoDataManager;

const GREETINGS: &[&str] = &["hello", "hi", "hey", "greetings"];
const PRICE_WORDS: &[&str] = &["price", "cost", "costs", "much", "expensive", "cheap"];
const ORDER_WORDS: &[&str] = &["order", "delivery", "shipping", "arrive", "track", "parcel"];

/// Reply chosen for an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub product_id: Option<ProductId>,
}

/// Pick a canned reply for `message`, mentioning a product from `products`
/// when its name appears in the text.
#[must_use]
pub fn compose_reply(message: &str, products: &[Product]) -> Reply {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |vocab: &[&str]| words.iter().any(|w| vocab.contains(w));

    let product = products
        .iter()
        .find(|p| !p.name.is_empty() && lower.contains(&p.name.to_lowercase()));

    let content = match product {
        Some(p) if mentions(PRICE_WORDS) => format!("{} costs ${}.", p.name, p.price),
        Some(p) if p.in_stock() => format!(
            "{} is in stock ({} left) at ${}. Would you like to order it?",
            p.name, p.quantity, p.price
        ),
        Some(p) => format!(
            "{} is currently out of stock. I can let you know when it is back.",
            p.name
        ),
        None if mentions(ORDER_WORDS) => {
            "I've passed your order question to our team. You'll get an update shortly.".to_string()
        }
        None if mentions(PRICE_WORDS) => match products.iter().map(|p| p.price).min() {
            Some(min) => format!("Our prices start at ${min}. Which product are you interested in?"),
            None => "Which product are you interested in?".to_string(),
        },
        None if mentions(GREETINGS) => "Hello! How can I help you today?".to_string(),
        None => "Thanks for your message! An operator will follow up shortly.".to_string(),
    };

    Reply {
        content,
        product_id: product.map(|p| p.id),
    }
}

/// Appends assistant replies to demo chats after a delay.
#[derive(Clone)]
pub struct AssistantSimulator {
    demo: DemoDataManager,
    delay: Duration,
    cancel: CancellationToken,
}

impl AssistantSimulator {
    #[must_use]
    pub const fn new(demo: DemoDataManager, delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            demo,
            delay,
            cancel,
        }
    }

    /// Wait for the reply delay, then append one `BOT` message to `chat_id`.
    ///
    /// Returns `None` if cancelled before the delay elapsed, if the chat no
    /// longer exists, or if the store rejects the write.
    #[instrument(skip(self, user_message), fields(chat_id = %chat_id))]
    pub async fn reply_after_delay(&self, chat_id: ChatId, user_message: &str) -> Option<Message> {
        tokio::select! {
            () = self.cancel.cancelled() => {
                debug!("Assistant reply cancelled");
                return None;
            }
            () = tokio::time::sleep(self.delay) => {}
        }

        let reply = compose_reply(user_message, &self.demo.products());
        match self
            .demo
            .add_message(chat_id, Sender::Bot, &reply.content, reply.product_id)
        {
            Ok(message) => {
                debug!(message_id = %message.id, "Assistant replied");
                Some(message)
            }
            Err(e) => {
                warn!(error = %e, "Failed to store assistant reply");
                None
            }
        }
    }
}
