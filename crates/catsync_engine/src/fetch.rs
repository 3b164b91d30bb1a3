//! Offset-paginated fetching from a platform items API.
//!
//! The loop is a small state machine:
//!
//! ```text
//! AwaitingPage(offset) --items--> AwaitingPage(offset + page_size)
//! AwaitingPage(offset) --empty--> Done
//! AwaitingPage(offset) --error--> Failed
//! ```
//!
//! End of data is signalled only by an empty page, never by a short one.
//! Fetching is all-or-nothing: a failure discards every page already read.

use crate::credentials::ApiToken;
use crate::error::{excerpt, FetchError};
use crate::transport::{HttpClient, HttpRequest, Transport};
use catsync_core::{CellValue, Platform, RawRecord, RawRecordSet};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Waiting for the page starting at `offset`.
    AwaitingPage {
        /// Offset of the next page.
        offset: usize,
    },
    /// An empty page was received.
    Done,
    /// The fetch failed.
    Failed,
}

/// Drives the page loop against one endpoint.
pub struct PaginatedFetcher<'a, C: HttpClient> {
    transport: &'a Transport<C>,
    platform: Platform,
    items_key: String,
}

impl<'a, C: HttpClient> PaginatedFetcher<'a, C> {
    /// Creates a fetcher for `platform` reading the `items` key of each page.
    pub fn new(transport: &'a Transport<C>, platform: Platform) -> Self {
        Self {
            transport,
            platform,
            items_key: "items".to_string(),
        }
    }

    /// Sets the key of the item array in a page document.
    #[must_use]
    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = key.into();
        self
    }

    /// Fetches every page and returns the concatenated items in order.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MissingCredential`] without any request when
    ///   `credential` is `None`
    /// - [`FetchError::Rejected`] on the first non-2xx page
    /// - [`FetchError::Transport`] once retries are exhausted
    /// - [`FetchError::Malformed`] when a page is not a JSON item list
    /// - [`FetchError::OffsetOverflow`] when the next offset would not fit
    pub fn fetch_all(
        &self,
        endpoint: &str,
        credential: Option<&ApiToken>,
        page_size: usize,
    ) -> Result<RawRecordSet, FetchError> {
        let Some(token) = credential else {
            warn!(platform = %self.platform, "no credential configured, not fetching");
            return Err(FetchError::MissingCredential {
                platform: self.platform,
            });
        };
        let page_size = page_size.max(1);

        let mut records = RawRecordSet::default();
        let mut pages = 0usize;
        let mut state = FetchState::AwaitingPage { offset: 0 };
        let mut failure = None;

        while let FetchState::AwaitingPage { offset } = state {
            match self.fetch_page(endpoint, token, page_size, offset) {
                Ok(items) if items.is_empty() => {
                    state = FetchState::Done;
                }
                Ok(items) => {
                    debug!(
                        platform = %self.platform,
                        offset,
                        items = items.len(),
                        "page received"
                    );
                    pages += 1;
                    for item in items {
                        records.push(item);
                    }
                    state = match offset.checked_add(page_size) {
                        Some(next) => FetchState::AwaitingPage { offset: next },
                        None => {
                            failure = Some(FetchError::OffsetOverflow { offset, page_size });
                            FetchState::Failed
                        }
                    };
                }
                Err(err) => {
                    warn!(
                        platform = %self.platform,
                        offset,
                        discarded = records.len(),
                        error = %err,
                        "fetch failed, discarding partial result"
                    );
                    failure = Some(err);
                    state = FetchState::Failed;
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        info!(
            platform = %self.platform,
            pages,
            records = records.len(),
            "fetch completed"
        );
        Ok(records)
    }

    fn fetch_page(
        &self,
        endpoint: &str,
        token: &ApiToken,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let request = HttpRequest::get(endpoint)
            .header("Authorization", token.bearer())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .query("limit", page_size)
            .query("offset", offset);

        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(FetchError::Rejected {
                status: response.status,
                body: excerpt(&response.body),
            });
        }

        let malformed = |reason: String| FetchError::Malformed { offset, reason };
        let document: Value =
            serde_json::from_slice(&response.body).map_err(|e| malformed(e.to_string()))?;
        let items = match document.get(&self.items_key) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(malformed(format!("`{}` is not an array", self.items_key)));
            }
        };

        items
            .iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), CellValue::from_json(v)))
                    .collect()),
                _ => Err(malformed("item is not an object".to_string())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::transport::ScriptedClient;

    fn token() -> ApiToken {
        ApiToken::new("t0k").unwrap()
    }

    #[test]
    fn missing_items_key_is_an_empty_page() {
        let client = ScriptedClient::new();
        client.push_response(200, r#"{"count": 0}"#);
        let transport = Transport::new(client.clone(), RetryPolicy::no_retry());
        let fetcher = PaginatedFetcher::new(&transport, Platform::NetSuite);

        let records = fetcher.fetch_all("http://erp/items", Some(&token()), 10).unwrap();
        assert!(records.is_empty());
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn non_json_page_is_malformed() {
        let client = ScriptedClient::new();
        client.push_response(200, "<html>");
        let transport = Transport::new(client, RetryPolicy::no_retry());
        let fetcher = PaginatedFetcher::new(&transport, Platform::NetSuite);

        let err = fetcher.fetch_all("http://erp/items", Some(&token()), 10).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { offset: 0, .. }));
    }

    #[test]
    fn custom_items_key() {
        let client = ScriptedClient::new();
        client
            .push_response(200, r#"{"data": [{"sku": "A", "title": "x"}]}"#)
            .push_response(200, r#"{"data": []}"#);
        let transport = Transport::new(client, RetryPolicy::no_retry());
        let fetcher = PaginatedFetcher::new(&transport, Platform::NetSuite).with_items_key("data");

        let records = fetcher.fetch_all("http://erp/items", Some(&token()), 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records.records()[0].get("sku"), Some(&CellValue::text("A")));
    }

    #[test]
    fn huge_page_size_fails_instead_of_wrapping() {
        let client = ScriptedClient::new();
        client
            .push_response(200, r#"{"items": [{"sku": "A"}]}"#)
            .push_response(200, r#"{"items": [{"sku": "B"}]}"#)
            .push_response(200, r#"{"items": []}"#);
        let transport = Transport::new(client.clone(), RetryPolicy::no_retry());

        let err = PaginatedFetcher::new(&transport, Platform::NetSuite)
            .fetch_all("http://erp/items", Some(&token()), usize::MAX)
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::OffsetOverflow {
                offset: usize::MAX,
                page_size: usize::MAX
            }
        ));
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn sends_bearer_and_offsets() {
        let client = ScriptedClient::new();
        client
            .push_response(200, r#"{"items": [{"sku": "A"}]}"#)
            .push_response(200, r#"{"items": []}"#);
        let transport = Transport::new(client.clone(), RetryPolicy::no_retry());
        PaginatedFetcher::new(&transport, Platform::NetSuite)
            .fetch_all("http://erp/items", Some(&token()), 25)
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].header_value("Authorization"), Some("Bearer t0k"));
        assert_eq!(requests[0].query_value("offset"), Some("0"));
        assert_eq!(requests[1].query_value("offset"), Some("25"));
        assert_eq!(requests[1].query_value("limit"), Some("25"));
    }
}
