use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use slotwatch_domain::constants::{DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use slotwatch_domain::{Result, SlotwatchError};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with per-request timeout and bounded retries.
///
/// Retries cover network failures, 5xx and 429 responses. Any other response
/// is handed back to the caller, who decides what a status means. With a
/// budget set, every attempt and backoff of one `send` fits inside it.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
    budget: Option<Duration>,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// # Errors
    /// `UpstreamUnavailable` when the peer could not be reached on any
    /// attempt; `MalformedInput` when the request itself is invalid.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let attempts = self.max_attempts.max(1);
        let deadline = self.budget.and_then(|budget| Instant::now().checked_add(budget));
        let mut attempt = 0;

        loop {
            attempt += 1;
            let remaining = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Err(SlotwatchError::UpstreamUnavailable(format!(
                            "request budget exhausted after {} attempt(s)",
                            attempt - 1
                        )));
                    }
                    left.min(self.timeout)
                }
                None => self.timeout,
            };
            let mut request = builder
                .try_clone()
                .ok_or_else(|| {
                    SlotwatchError::Internal("streaming request bodies cannot be retried".into())
                })?
                .build()
                .map_err(|err| SlotwatchError::from(InfraError::from(err)))?;
            *request.timeout_mut() = Some(remaining);

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, host = url.host_str().unwrap_or(""), path = url.path(), "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %status, "received HTTP response");
                    if is_retryable_status(status) && attempt < attempts && self.can_retry(attempt, deadline) {
                        self.backoff(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, %method, error = %err, "HTTP request failed");
                    if attempt < attempts && is_retryable_error(&err) && self.can_retry(attempt, deadline) {
                        self.backoff(attempt).await;
                        continue;
                    }
                    return Err(InfraError::from(err).into());
                }
            }
        }
    }

    /// Send and decode a JSON body, treating any non-2xx as an error
    pub async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let response = response.error_for_status().map_err(|err| SlotwatchError::from(InfraError::from(err)))?;
        response.json::<T>().await.map_err(|err| InfraError::from(err).into())
    }

    /// A retry is only worth it if the backoff leaves time for another attempt
    fn can_retry(&self, attempt: usize, deadline: Option<Instant>) -> bool {
        deadline.map_or(true, |deadline| Instant::now() + self.backoff_delay(attempt) < deadline)
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1).min(6)).unwrap_or(6);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn backoff(&self, attempt: usize) {
        let delay = self.backoff_delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    budget: Option<Duration>,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            budget: None,
            max_attempts: 2,
            base_backoff: Duration::from_millis(200),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Timeout for a single attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upper bound on one `send`, retries and backoff included
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| SlotwatchError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            timeout: self.timeout,
            budget: self.budget,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
