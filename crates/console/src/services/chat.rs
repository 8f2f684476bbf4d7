//! Chat service: chat list, message history and sending.
//!
//! Sending into an AI-enabled demo chat schedules a simulated assistant
//! reply in the background. The reply task invalidates the chat queries
//! itself once the reply is stored.

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use support_desk_core::{Chat, ChatId, Message, ProductId, SendMessage};

use crate::demo::AssistantSimulator;
use crate::error::AppError;
use crate::query::{Mutation, QueryClient, QueryKey, keys};

use super::Backend;

/// Result of sending a message.
#[derive(Debug)]
pub struct SentMessage {
    /// The stored message.
    pub message: Message,
    /// Pending assistant reply, when one was scheduled.
    pub reply: Option<JoinHandle<Option<Message>>>,
}

impl SentMessage {
    /// Wait for the assistant reply, if one was scheduled.
    ///
    /// Returns `None` when no reply was scheduled or it was cancelled.
    pub async fn wait_reply(self) -> Option<Message> {
        match self.reply?.await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Assistant reply task failed");
                None
            }
        }
    }
}

/// Chat operations against the active backend.
pub struct ChatService<'a> {
    backend: &'a Backend,
    queries: &'a QueryClient,
    assistant: Option<&'a AssistantSimulator>,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(
        backend: &'a Backend,
        queries: &'a QueryClient,
        assistant: Option<&'a AssistantSimulator>,
    ) -> Self {
        Self {
            backend,
            queries,
            assistant,
        }
    }

    /// All chats, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn list_chats(&self) -> Result<Vec<Chat>, AppError> {
        let backend = self.backend;
        self.queries.fetch(&keys::chats(), move || backend.chats()).await
    }

    /// A single chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat does not exist or the backend call fails.
    pub async fn get_chat(&self, id: ChatId) -> Result<Chat, AppError> {
        let backend = self.backend;
        self.queries
            .fetch(&keys::chat(id), move || backend.chat(id))
            .await
    }

    /// Messages of a chat, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn messages(&self, chat_id: ChatId) -> Result<Vec<Message>, AppError> {
        let backend = self.backend;
        self.queries
            .fetch(&keys::messages(chat_id), move || backend.messages(chat_id))
            .await
    }

    /// Send a message into a chat.
    ///
    /// Invalidates the chat's messages, the chat list and the dashboard.
    /// In demo mode, an AI-enabled chat also gets an assistant reply after
    /// the configured delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be stored.
    #[instrument(skip(self, content), fields(chat_id = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        content: &str,
        product_id: Option<ProductId>,
    ) -> Result<SentMessage, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let request = SendMessage {
            chat_id,
            content: content.to_string(),
            product_id,
        };

        let mut mutation = Mutation::new(chat_keys(chat_id));
        let message = mutation
            .execute(self.queries, self.backend.send_message(&request))
            .await?;
        info!(message_id = %message.id, "Message sent");

        let reply = self.schedule_reply(chat_id, content).await;
        Ok(SentMessage { message, reply })
    }

    /// Turn the assistant on or off for a chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat does not exist or the backend call fails.
    #[instrument(skip(self), fields(chat_id = %id))]
    pub async fn set_ai_enabled(&self, id: ChatId, enabled: bool) -> Result<Chat, AppError> {
        let mut mutation = Mutation::new([keys::chats(), keys::analytics()]);
        mutation
            .execute(self.queries, self.backend.set_ai_enabled(id, enabled))
            .await
    }

    /// Reset a chat's unread counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat does not exist or the backend call fails.
    #[instrument(skip(self), fields(chat_id = %id))]
    pub async fn mark_read(&self, id: ChatId) -> Result<Chat, AppError> {
        let mut mutation = Mutation::new([keys::chats(), keys::analytics()]);
        mutation
            .execute(self.queries, self.backend.mark_read(id))
            .await
    }

    async fn schedule_reply(
        &self,
        chat_id: ChatId,
        content: &str,
    ) -> Option<JoinHandle<Option<Message>>> {
        let assistant = self.assistant?.clone();

        match self.backend.chat(chat_id).await {
            Ok(chat) if chat.ai_enabled => {}
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "Could not look up chat for assistant reply");
                return None;
            }
        }

        debug!("Scheduling assistant reply");
        let queries = self.queries.clone();
        let content = content.to_string();
        Some(tokio::spawn(async move {
            let reply = assistant.reply_after_delay(chat_id, &content).await;
            if reply.is_some() {
                for key in chat_keys(chat_id) {
                    queries.invalidate(&key).await;
                }
            }
            reply
        }))
    }
}

fn chat_keys(chat_id: ChatId) -> [QueryKey; 3] {
    [keys::messages(chat_id), keys::chats(), keys::analytics()]
}
