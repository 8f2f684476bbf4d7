//! Writes that invalidate dependent queries.

use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use super::client::QueryClient;
use super::key::QueryKey;

/// Lifecycle of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error(String),
}

/// A write operation bound to the query keys it makes stale.
#[derive(Debug, Clone)]
pub struct Mutation {
    invalidates: Vec<QueryKey>,
    status: MutationStatus,
}

impl Mutation {
    #[must_use]
    pub fn new(invalidates: impl IntoIterator<Item = QueryKey>) -> Self {
        Self {
            invalidates: invalidates.into_iter().collect(),
            status: MutationStatus::Idle,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &MutationStatus {
        &self.status
    }

    #[must_use]
    pub fn invalidates(&self) -> &[QueryKey] {
        &self.invalidates
    }

    /// Run `operation`; on success invalidate the declared keys.
    ///
    /// # Errors
    ///
    /// Returns the operation's error. Nothing is invalidated in that case.
    pub async fn execute<T, E, Fut>(&mut self, client: &QueryClient, operation: Fut) -> Result<T, E>
    where
        E: fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with(client, operation, |_| {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_success` with the result
    /// before invalidating.
    ///
    /// # Errors
    ///
    /// Returns the operation's error. Neither `on_success` nor invalidation
    /// runs in that case.
    pub async fn execute_with<T, E, Fut, S>(
        &mut self,
        client: &QueryClient,
        operation: Fut,
        on_success: S,
    ) -> Result<T, E>
    where
        E: fmt::Display,
        Fut: Future<Output = Result<T, E>>,
        S: FnOnce(&T),
    {
        self.status = MutationStatus::Pending;

        match operation.await {
            Ok(value) => {
                self.status = MutationStatus::Success;
                on_success(&value);
                for key in &self.invalidates {
                    client.invalidate(key).await;
                }
                debug!(keys = self.invalidates.len(), "Mutation succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Mutation failed");
                self.status = MutationStatus::Error(e.to_string());
                Err(e)
            }
        }
    }
}
