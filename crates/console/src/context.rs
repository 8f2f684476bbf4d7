//! Application context shared by every entry point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::demo::{AssistantSimulator, DemoDataManager};
use crate::error::AppError;
use crate::query::QueryClient;
use crate::services::{AnalyticsService, Backend, CatalogService, ChatService, OrderService};
use crate::store::{FileStore, KeyValueStore};

/// Configuration, the selected backend and the query cache.
///
/// Cheap to clone. Background work spawned through the context stops when
/// [`shutdown`](Self::shutdown) is called.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: ConsoleConfig,
    backend: Backend,
    queries: QueryClient,
    assistant: Option<AssistantSimulator>,
    shutdown: CancellationToken,
}

impl AppContext {
    /// Build the context for `config`.
    ///
    /// In demo mode the store under `config.demo.data_dir` is opened and
    /// seeded if empty; otherwise an API client is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the demo store cannot be opened or seeded, or the
    /// HTTP client cannot be built.
    pub fn new(config: ConsoleConfig) -> Result<Self, AppError> {
        if config.demo_mode() {
            let store = FileStore::open(config.demo.data_dir.clone())?;
            Self::with_store(config, Arc::new(store))
        } else {
            let api = ApiClient::new(&config.api)?;
            info!(base_url = %api.base_url(), "Using remote backend");
            Ok(Self::from_parts(
                config,
                Backend::Remote(api),
                None,
                CancellationToken::new(),
            ))
        }
    }

    /// Build a demo-mode context over an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be seeded.
    pub fn with_store(
        config: ConsoleConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, AppError> {
        let demo = DemoDataManager::new(store, config.demo.clone());
        if demo.initialize()? {
            info!("Demo store seeded");
        }
        info!(data_dir = %config.demo.data_dir.display(), "Using demo backend");

        let shutdown = CancellationToken::new();
        let assistant =
            AssistantSimulator::new(demo.clone(), config.demo.reply_delay, shutdown.child_token());
        Ok(Self::from_parts(
            config,
            Backend::Demo(demo),
            Some(assistant),
            shutdown,
        ))
    }

    fn from_parts(
        config: ConsoleConfig,
        backend: Backend,
        assistant: Option<AssistantSimulator>,
        shutdown: CancellationToken,
    ) -> Self {
        let queries = QueryClient::new(config.query);
        Self {
            inner: Arc::new(AppContextInner {
                config,
                backend,
                queries,
                assistant,
                shutdown,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn queries(&self) -> &QueryClient {
        &self.inner.queries
    }

    /// The demo store, when running in demo mode.
    #[must_use]
    pub fn demo(&self) -> Option<&DemoDataManager> {
        self.inner.backend.demo()
    }

    /// Token cancelled on shutdown; pass child tokens to long-running work.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn chats(&self) -> ChatService<'_> {
        ChatService::new(
            &self.inner.backend,
            &self.inner.queries,
            self.inner.assistant.as_ref(),
        )
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.inner.backend, &self.inner.queries)
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.inner.backend, &self.inner.queries)
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsService<'_> {
        AnalyticsService::new(
            &self.inner.backend,
            &self.inner.queries,
            self.inner.config.low_stock_threshold,
        )
    }

    /// Cancel pending background work such as assistant replies.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("Shutting down");
            self.inner.shutdown.cancel();
        }
    }
}
