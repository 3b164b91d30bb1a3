//! Blocking HTTP client backed by `ureq`.

use crate::error::TransportFailure;
use crate::transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use std::time::Duration;
use ureq::{Agent, RequestBuilder};

/// Production [`HttpClient`].
///
/// Error statuses are returned as responses so the caller decides what a
/// rejection means; only exchanges without a response become failures.
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: Agent,
}

impl UreqClient {
    /// Creates a client with a global per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(&request.url), request).call(),
            HttpMethod::Post => {
                let builder = prepare(self.agent.post(&request.url), request);
                match &request.body {
                    Some(body) => builder.send(body.as_slice()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec().map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    builder
}

fn classify(err: ureq::Error) -> TransportFailure {
    match err {
        ureq::Error::Timeout(_) => TransportFailure::timeout(err.to_string()),
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            TransportFailure::connection(err.to_string())
        }
        other => TransportFailure::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportFailureKind;

    #[test]
    fn unreachable_host_is_a_connection_failure() {
        // Nothing listens on the discard port.
        let client = UreqClient::new(Duration::from_secs(2));
        let err = client
            .execute(&HttpRequest::get("http://127.0.0.1:9/items"))
            .unwrap_err();
        assert_ne!(err.kind, TransportFailureKind::Other, "{err}");
    }

    #[test]
    fn classifies_client_errors() {
        let failure = classify(ureq::Error::ConnectionFailed);
        assert_eq!(failure.kind, TransportFailureKind::ConnectionError);
        let failure = classify(ureq::Error::BadUri("nope".into()));
        assert_eq!(failure.kind, TransportFailureKind::Other);
    }
}
