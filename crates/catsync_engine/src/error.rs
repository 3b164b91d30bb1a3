//! Error types for the sync engine.

use crate::config::RetryPolicy;
use catsync_core::{CoreError, Platform};
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Classification of a failed HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFailureKind {
    /// The connection could not be established or was lost.
    ConnectionError,
    /// The request did not complete in time.
    Timeout,
    /// Anything else (malformed URL, TLS, protocol).
    Other,
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportFailureKind::ConnectionError => "connection error",
            TransportFailureKind::Timeout => "timeout",
            TransportFailureKind::Other => "transport error",
        })
    }
}

/// A request that produced no HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    /// Failure class, used by the retry policy.
    pub kind: TransportFailureKind,
    /// Underlying client message.
    pub message: String,
}

impl TransportFailure {
    /// Creates a failure.
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::ConnectionError, message)
    }

    /// Creates a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Timeout, message)
    }

    /// Creates an unclassified failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Other, message)
    }

    /// Returns true if `policy` treats this failure as transient.
    pub fn is_retryable_under(&self, policy: &RetryPolicy) -> bool {
        policy.retryable.contains(&self.kind)
    }
}

/// Errors raised by the paginated fetcher.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No credential configured. No request was made.
    #[error("missing credential for {platform}")]
    MissingCredential {
        /// Platform whose credential is absent.
        platform: Platform,
    },

    /// Transport failed after exhausting retries.
    #[error("fetch transport failure: {0}")]
    Transport(#[from] TransportFailure),

    /// The API answered with a non-success status.
    #[error("fetch rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The next page offset does not fit in `usize`.
    #[error("page offset overflow after offset {offset} with page size {page_size}")]
    OffsetOverflow {
        /// Offset of the last page read.
        offset: usize,
        /// Requested page size.
        page_size: usize,
    },

    /// The response body was not a page document.
    #[error("malformed page at offset {offset}: {reason}")]
    Malformed {
        /// Offset of the offending page.
        offset: usize,
        /// Parse error.
        reason: String,
    },
}

/// Errors raised by deliverers.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Delivery was called with zero rows.
    #[error("refusing to deliver an empty record set")]
    EmptyInput,

    /// No credential configured for the destination API.
    #[error("missing credential for {platform}")]
    MissingCredential {
        /// Destination platform.
        platform: Platform,
    },

    /// The destination answered with a non-success status.
    #[error("delivery of `{record}` rejected with status {status}: {body}")]
    Rejected {
        /// Title or SKU of the rejected record.
        record: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
        /// Records accepted before the rejection.
        delivered: usize,
    },

    /// Transport failed after exhausting retries.
    #[error("delivery transport failure after {delivered} records: {source}")]
    Transport {
        /// Underlying failure.
        source: TransportFailure,
        /// Records accepted before the failure.
        delivered: usize,
    },

    /// Writing the export file failed.
    #[error("export to {path} failed: {message}")]
    Io {
        /// Target path.
        path: String,
        /// Error message.
        message: String,
    },
}

impl DeliveryError {
    /// Records the destination accepted before the failure.
    pub fn delivered(&self) -> usize {
        match self {
            DeliveryError::Rejected { delivered, .. } | DeliveryError::Transport { delivered, .. } => {
                *delivered
            }
            _ => 0,
        }
    }
}

/// Stage-fatal errors escalated to the orchestrator.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Normalization or mapping failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Fetching from the source API failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Delivery to the destination failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// A source file could not be read.
    #[error("cannot read {path}: {message}")]
    Source {
        /// Source path.
        path: String,
        /// Error message.
        message: String,
    },

    /// Unknown pipeline name.
    #[error("unknown pipeline `{name}` (available: {available})")]
    UnknownPipeline {
        /// Requested name.
        name: String,
        /// Comma-separated list of known pipelines.
        available: String,
    },
}

/// Truncates a response body for error messages.
pub(crate) fn excerpt(body: &[u8]) -> String {
    const LIMIT: usize = 512;
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}
