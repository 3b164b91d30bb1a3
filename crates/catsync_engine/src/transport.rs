//! Transport layer: one HTTP exchange with bounded retry.
//!
//! The actual HTTP client is abstracted behind [`HttpClient`] so the fetcher
//! and the API exporter can be driven by a scripted client in tests and by
//! [`crate::UreqClient`] in production.

use crate::config::RetryPolicy;
use crate::error::TransportFailure;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a query parameter.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A received response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implementations perform exactly one exchange per call and never retry;
/// retry lives in [`Transport`].
pub trait HttpClient: Send + Sync {
    /// Executes one request.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        (**self).execute(request)
    }
}

/// An HTTP client with an injected retry policy.
pub struct Transport<C: HttpClient> {
    client: C,
    policy: RetryPolicy,
}

impl<C: HttpClient> Transport<C> {
    /// Creates a transport.
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Sends a request, retrying transient failures.
    ///
    /// Any HTTP response is returned as-is, including 4xx and 5xx.
    ///
    /// # Errors
    ///
    /// Returns the last [`TransportFailure`] once the policy gives up.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut attempt = 1;
        loop {
            match self.client.execute(request) {
                Ok(response) => {
                    debug!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status,
                        attempt,
                        "request completed"
                    );
                    return Ok(response);
                }
                Err(failure) if self.policy.should_retry(&failure, attempt) => {
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %failure,
                        "request failed, retrying"
                    );
                    if !self.policy.delay.is_zero() {
                        thread::sleep(self.policy.delay);
                    }
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        error = %failure,
                        "request failed"
                    );
                    return Err(failure);
                }
            }
        }
    }
}

/// A scripted client for testing.
///
/// Replays queued outcomes in order and records every request. Clones share
/// the same script and log. An exhausted script answers with an empty page.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    inner: Arc<Mutex<Script>>,
}

#[derive(Debug, Default)]
struct Script {
    outcomes: VecDeque<Result<HttpResponse, TransportFailure>>,
    requests: Vec<HttpRequest>,
}

impl ScriptedClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.inner
            .lock()
            .outcomes
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queues a transport failure.
    pub fn push_failure(&self, failure: TransportFailure) -> &Self {
        self.inner.lock().outcomes.push_back(Err(failure));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().requests.clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    /// Number of queued outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inner.lock().outcomes.len()
    }
}

impl HttpClient for ScriptedClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut script = self.inner.lock();
        script.requests.push(request.clone());
        script
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, r#"{"items":[]}"#)))
    }
}
