//! Configuration for the sync engine.

use crate::error::{TransportFailure, TransportFailureKind};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default ERP items endpoint.
pub const DEFAULT_NETSUITE_URL: &str =
    "https://account.suitetalk.api.netsuite.com/services/rest/record/v1/item";

/// Default secondary storefront products endpoint.
pub const DEFAULT_ZOEY_URL: &str = "https://api.zoey.com/v1/products";

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// ERP items endpoint.
    pub netsuite_url: String,
    /// Items requested per page.
    pub page_size: usize,
    /// Key of the item array in a page document.
    pub items_key: String,
    /// Secondary storefront products endpoint.
    pub zoey_url: String,
    /// Storefront product export read by file-based pipelines.
    pub shopify_export: PathBuf,
    /// Offline ERP export read by file-based pipelines.
    pub netsuite_export: PathBuf,
    /// Directory receiving export files.
    pub output_dir: PathBuf,
    /// Export file format.
    pub export_format: ExportFormat,
    /// Retry policy applied to every request.
    pub retry: RetryPolicy,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with default endpoints and paths.
    pub fn new() -> Self {
        Self {
            netsuite_url: DEFAULT_NETSUITE_URL.to_string(),
            page_size: 1000,
            items_key: "items".to_string(),
            zoey_url: DEFAULT_ZOEY_URL.to_string(),
            shopify_export: PathBuf::from("shopify_export.xlsx"),
            netsuite_export: PathBuf::from("output.xlsx"),
            output_dir: PathBuf::from("."),
            export_format: ExportFormat::Csv,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overlays `CATSYNC_*` environment variables on the defaults.
    pub fn from_env() -> Self {
        Self::new().with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlays values from a variable lookup.
    ///
    /// Unparsable numbers are ignored with a warning.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = var("CATSYNC_NETSUITE_URL") {
            self.netsuite_url = url;
        }
        if let Some(url) = var("CATSYNC_ZOEY_URL") {
            self.zoey_url = url;
        }
        if let Some(size) = var("CATSYNC_PAGE_SIZE") {
            match size.trim().parse::<usize>() {
                Ok(size) if size > 0 => self.page_size = size,
                _ => warn!(value = %size, "ignoring invalid CATSYNC_PAGE_SIZE"),
            }
        }
        if let Some(dir) = var("CATSYNC_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    /// Sets the ERP items endpoint.
    pub fn with_netsuite_url(mut self, url: impl Into<String>) -> Self {
        self.netsuite_url = url.into();
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the secondary storefront endpoint.
    pub fn with_zoey_url(mut self, url: impl Into<String>) -> Self {
        self.zoey_url = url.into();
        self
    }

    /// Sets the storefront export path.
    pub fn with_shopify_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.shopify_export = path.into();
        self
    }

    /// Sets the offline ERP export path.
    pub fn with_netsuite_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.netsuite_export = path.into();
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the export format.
    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
    /// Single-sheet xlsx workbook with a header row.
    Excel,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" | "jsonl" => Ok(ExportFormat::Json),
            "xlsx" | "excel" => Ok(ExportFormat::Excel),
            other => Err(format!(
                "unsupported export format `{other}` (expected csv, json or xlsx)"
            )),
        }
    }
}

/// Bounded retry with a fixed delay.
///
/// Only failures whose kind is listed in `retryable` are retried. HTTP
/// responses, whatever their status, are never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
    /// Failure kinds worth another attempt.
    pub retryable: Vec<TransportFailureKind>,
}

impl RetryPolicy {
    /// Creates a policy with `max_attempts` and the default delay and kinds.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_secs(2),
            retryable: vec![
                TransportFailureKind::ConnectionError,
                TransportFailureKind::Timeout,
            ],
        }
    }

    /// Creates a policy with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            retryable: Vec::new(),
        }
    }

    /// Sets the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the retryable failure kinds.
    pub fn with_retryable(mut self, kinds: impl IntoIterator<Item = TransportFailureKind>) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    /// Returns true if `failure` on attempt `attempt` (1-based) warrants another try.
    pub fn should_retry(&self, failure: &TransportFailure, attempt: u32) -> bool {
        attempt < self.max_attempts && failure.is_retryable_under(self)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_netsuite_url("http://erp.test/items")
            .with_page_size(50)
            .with_output_dir("/tmp/out")
            .with_export_format(ExportFormat::Json)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.netsuite_url, "http://erp.test/items");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.export_format, ExportFormat::Json);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.zoey_url, DEFAULT_ZOEY_URL);
    }

    #[test]
    fn environment_overlay() {
        let vars: HashMap<&str, &str> = [
            ("CATSYNC_ZOEY_URL", "http://zoey.test"),
            ("CATSYNC_PAGE_SIZE", "not-a-number"),
            ("CATSYNC_OUTPUT_DIR", "  "),
        ]
        .into_iter()
        .collect();
        let config = SyncConfig::new().with_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.zoey_url, "http://zoey.test");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));

        let timeout = TransportFailure::timeout("slow");
        assert!(policy.should_retry(&timeout, 1));
        assert!(policy.should_retry(&timeout, 2));
        assert!(!policy.should_retry(&timeout, 3));
        assert!(!policy.should_retry(&TransportFailure::other("bad url"), 1));
    }

    #[test]
    fn retry_policy_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.should_retry(&TransportFailure::connection("refused"), 1));
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("excel".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
        assert!("xls".parse::<ExportFormat>().is_err());
    }
}
