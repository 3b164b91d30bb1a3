//! # catsync engine
//!
//! Fetch, deliver and pipeline orchestration for catsync.
//!
//! This crate provides:
//! - Transport with an explicit retry policy and a `ureq` client
//! - Offset-paginated fetching from platform items APIs
//! - CSV, JSON and xlsx file sources
//! - API and file deliverers
//! - The sync orchestrator running the named pipelines
//!
//! ## Architecture
//!
//! A pipeline is a fixed composition:
//! 1. Fetch raw rows (paginated API or export file)
//! 2. Normalize into canonical products with the source schema
//! 3. Map into the target schema
//! 4. Deliver (one POST per product, or an import file)
//!
//! ## Key Invariants
//!
//! - A missing credential is detected before any request
//! - Fetching is all-or-nothing
//! - Only connection errors and timeouts are retried, never HTTP statuses
//! - An empty intermediate set aborts the run before delivery

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credentials;
mod deliver;
mod error;
mod fetch;
mod http;
mod orchestrator;
mod source;
mod transport;

pub use config::{ExportFormat, RetryPolicy, SyncConfig, DEFAULT_NETSUITE_URL, DEFAULT_ZOEY_URL};
pub use credentials::{token_variable, ApiToken, Credentials};
pub use deliver::{write_csv, write_json_lines, write_xlsx, ApiExporter, Deliver, FileExporter};
pub use error::{
    DeliveryError, FetchError, SyncError, SyncResult, TransportFailure, TransportFailureKind,
};
pub use fetch::{FetchState, PaginatedFetcher};
pub use http::UreqClient;
pub use orchestrator::{
    convert_file, ConversionSummary, Orchestrator, PipelineName, SourceKind, Stage, StageReport,
    SyncReport, SyncStatus, TargetKind,
};
pub use source::{read_csv, read_json, read_xlsx, FileSource, SourceFormat};
pub use transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ScriptedClient, Transport};
