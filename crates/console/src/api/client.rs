//! Request core shared by every backend call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;

use super::error::ApiError;
use super::retry::RetryPolicy;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Attach the session's bearer token, if one is configured.
    pub requires_auth: bool,
    /// Abort the request (including any backoff wait) when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    /// Options for an authenticated request.
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            cancel: None,
        }
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Backend API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session_token: Option<SecretString>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                session_token: config.session_token.clone(),
                retry: config.retry,
            }),
        })
    }

    /// Base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// GET `endpoint`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, endpoint, None, options).await
    }

    /// POST a JSON body to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn post<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        self.execute(Method::POST, endpoint, Some(body), options).await
    }

    /// PUT a JSON body to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn put<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        self.execute(Method::PUT, endpoint, Some(body), options).await
    }

    /// DELETE `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.execute(Method::DELETE, endpoint, None, options).await
    }

    /// Send a request, retrying GETs, and decode the JSON response.
    #[instrument(skip(self, body, options), fields(method = %method, endpoint = %endpoint))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint)?;
        let policy = self.inner.retry;
        let max_retries = if method == Method::GET {
            policy.max_retries
        } else {
            0
        };

        let mut retry = 0;
        let text = loop {
            match self.send_once(&method, &url, body.as_ref(), options).await {
                Ok(text) => break text,
                Err(e) if retry < max_retries && e.is_transient() => {
                    let delay = policy.delay_for(retry);
                    warn!(error = %e, retry = retry + 1, delay_ms = delay.as_millis(), "Retrying request");
                    wait(delay, options.cancel.as_ref()).await?;
                    retry += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Request failed");
                    return Err(e);
                }
            }
        };

        // Empty bodies (e.g. 204) decode as JSON null
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            warn!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to decode response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// One attempt: send, check the status, read the body.
    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<String, ApiError> {
        let mut request = self
            .inner
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        if options.requires_auth {
            match &self.inner.session_token {
                Some(token) => request = request.bearer_auth(token.expose_secret()),
                None => debug!("No session token available, sending without auth"),
            }
        }

        let attempt = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            debug!(status = %status, bytes = text.len(), "Response received");

            if status.is_success() {
                Ok(text)
            } else {
                Err(ApiError::from_response(status, &text))
            }
        };

        match &options.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(ApiError::Cancelled),
                result = attempt => result,
            },
            None => attempt.await,
        }
    }

    fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

async fn wait(delay: Duration, cancel: Option<&CancellationToken>) -> Result<(), ApiError> {
    match cancel {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(ApiError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig::new(Url::parse(base).expect("url"));
        ApiClient::new(&config).expect("client")
    }

    #[test]
    fn test_url_joining() {
        let api = client("http://localhost:3001/api");
        assert_eq!(
            api.url("/chats").expect("url").as_str(),
            "http://localhost:3001/api/chats"
        );
        assert_eq!(
            api.url("messages/42").expect("url").as_str(),
            "http://localhost:3001/api/messages/42"
        );

        let api = client("http://localhost:3001/api/");
        assert_eq!(
            api.url("/products").expect("url").as_str(),
            "http://localhost:3001/api/products"
        );
    }

    #[test]
    fn test_request_options() {
        let options = RequestOptions::default();
        assert!(!options.requires_auth);

        let token = CancellationToken::new();
        let options = RequestOptions::authenticated().with_cancel(token);
        assert!(options.requires_auth);
        assert!(options.cancel.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let api = client("http://127.0.0.1:9/api");
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<serde_json::Value, ApiError> = api
            .get("/chats", &RequestOptions::default().with_cancel(token))
            .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[test]
    fn test_api_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<ApiClient>();
    }
}
