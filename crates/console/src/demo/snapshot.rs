//! Export/import format for the demo store and its validator.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use support_desk_core::{Chat, ChatId, Message, Order, Product};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Every demo entity at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSnapshot {
    pub version: u32,
    #[serde(default)]
    pub demo_mode: bool,
    pub chats: Vec<Chat>,
    pub messages: Vec<Message>,
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl DemoSnapshot {
    /// Whether the snapshot holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
            && self.messages.is_empty()
            && self.products.is_empty()
            && self.orders.is_empty()
    }

    /// Check cross-entity invariants.
    ///
    /// # Errors
    ///
    /// Returns a report listing every problem found.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut issues = Vec::new();

        if self.version != SNAPSHOT_VERSION {
            issues.push(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            ));
        }

        check_unique("chat", self.chats.iter().map(|c| c.id), &mut issues);
        check_unique("message", self.messages.iter().map(|m| m.id), &mut issues);
        check_unique("product", self.products.iter().map(|p| p.id), &mut issues);
        check_unique("order", self.orders.iter().map(|o| o.id), &mut issues);

        let chat_ids: HashSet<ChatId> = self.chats.iter().map(|c| c.id).collect();
        for message in &self.messages {
            if !chat_ids.contains(&message.chat_id) {
                issues.push(format!(
                    "message {} references unknown chat {}",
                    message.id, message.chat_id
                ));
            }
        }

        for order in &self.orders {
            if let Err(e) = order.validate() {
                issues.push(e.to_string());
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { issues })
        }
    }
}

fn check_unique<T>(kind: &str, ids: impl Iterator<Item = T>, issues: &mut Vec<String>)
where
    T: Eq + Hash + std::fmt::Display,
{
    let mut seen = HashSet::new();
    for id in ids {
        if seen.contains(&id) {
            issues.push(format!("duplicate {kind} id {id}"));
        } else {
            seen.insert(id);
        }
    }
}

/// Problems found while validating imported demo data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid demo data: {}", .issues.join("; "))]
pub struct ValidationReport {
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// A report with a single issue.
    #[must_use]
    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

/// Parse and validate an exported snapshot.
///
/// # Errors
///
/// Returns a report if the JSON is malformed or violates an invariant.
pub fn parse_snapshot(json: &str) -> Result<DemoSnapshot, ValidationReport> {
    let snapshot: DemoSnapshot = serde_json::from_str(json)
        .map_err(|e| ValidationReport::single(format!("malformed demo data: {e}")))?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use support_desk_core::{Price, Sender};

    fn snapshot() -> DemoSnapshot {
        let now = Utc::now();
        let chat = Chat::new("Anna", true, now);
        let message = Message::new(chat.id, Sender::User, "hi", now);
        DemoSnapshot {
            version: SNAPSHOT_VERSION,
            demo_mode: true,
            chats: vec![chat],
            messages: vec![message],
            products: vec![Product::new("Tea", Price::from_cents(100), "Drinks")],
            orders: vec![],
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn test_dangling_message_reported() {
        let mut snap = snapshot();
        snap.chats.clear();
        let report = snap.validate().expect_err("should fail");
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("unknown chat"));
    }

    #[test]
    fn test_duplicate_ids_and_version_reported() {
        let mut snap = snapshot();
        snap.version = 9;
        let dup = snap.products[0].clone();
        snap.products.push(dup);
        let report = snap.validate().expect_err("should fail");
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let report = parse_snapshot("not json").expect_err("should fail");
        assert!(report.to_string().starts_with("invalid demo data: malformed demo data"));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(parse_snapshot(r#"{"version":1,"chats":{}}"#).is_err());
    }

    #[test]
    fn test_missing_orders_default_to_empty() {
        let json = r#"{"version":1,"chats":[],"messages":[],"products":[]}"#;
        let snap = parse_snapshot(json).expect("parse");
        assert!(snap.orders.is_empty());
        assert!(snap.is_empty());
    }
}
