//! Hierarchical query keys.

use std::fmt;

/// Cache key made of path segments, e.g. `["messages", "<chat id>"]`.
///
/// Invalidation matches by prefix, so invalidating `["messages"]` covers
/// every chat's message list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append a segment.
    #[must_use]
    pub fn with(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` is a leading run of this key's segments.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Keys used by the console's services.
pub mod keys {
    use support_desk_core::{ChatId, OrderId};

    use super::QueryKey;

    #[must_use]
    pub fn chats() -> QueryKey {
        QueryKey::new(["chats"])
    }

    #[must_use]
    pub fn chat(id: ChatId) -> QueryKey {
        chats().with(id)
    }

    /// Prefix of every chat's message list.
    #[must_use]
    pub fn all_messages() -> QueryKey {
        QueryKey::new(["messages"])
    }

    #[must_use]
    pub fn messages(chat_id: ChatId) -> QueryKey {
        all_messages().with(chat_id)
    }

    #[must_use]
    pub fn products() -> QueryKey {
        QueryKey::new(["products"])
    }

    #[must_use]
    pub fn orders() -> QueryKey {
        QueryKey::new(["orders"])
    }

    #[must_use]
    pub fn order(id: OrderId) -> QueryKey {
        orders().with(id)
    }

    #[must_use]
    pub fn analytics() -> QueryKey {
        QueryKey::new(["analytics"])
    }
}
