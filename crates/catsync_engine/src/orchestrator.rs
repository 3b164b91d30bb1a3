//! Named pipelines: fetch, normalize, map, deliver.
//!
//! Every run builds its stages from scratch and owns its record sets from
//! start to finish. Nothing is cached between runs, so pipelines never
//! observe each other.

use crate::config::{ExportFormat, SyncConfig};
use crate::credentials::Credentials;
use crate::deliver::{ApiExporter, Deliver, FileExporter};
use crate::error::{SyncError, SyncResult};
use crate::fetch::PaginatedFetcher;
use crate::http::UreqClient;
use crate::source::FileSource;
use crate::transport::{HttpClient, Transport};
use catsync_core::{normalize, Mapper, Platform, RawRecordSet};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// The fixed set of pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineName {
    /// ERP API to storefront import file.
    NetsuiteToShopify,
    /// ERP API to secondary storefront API.
    NetsuiteToZoey,
    /// Storefront export file to secondary storefront API.
    ShopifyToZoey,
    /// Offline ERP export file to storefront import file.
    NetsuiteFileToShopify,
}

/// Where a pipeline reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Paginated items API.
    Api(Platform),
    /// Export file.
    File(Platform),
}

/// Where a pipeline delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// One POST per product.
    Api(Platform),
    /// Import file in the output directory.
    File(Platform),
}

impl SourceKind {
    /// Platform whose schema the source uses.
    pub fn platform(self) -> Platform {
        match self {
            SourceKind::Api(p) | SourceKind::File(p) => p,
        }
    }
}

impl TargetKind {
    /// Platform whose schema the target uses.
    pub fn platform(self) -> Platform {
        match self {
            TargetKind::Api(p) | TargetKind::File(p) => p,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Api(p) => write!(f, "{p} api"),
            SourceKind::File(p) => write!(f, "{p} file"),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Api(p) => write!(f, "{p} api"),
            TargetKind::File(p) => write!(f, "{p} file"),
        }
    }
}

impl PipelineName {
    /// All pipelines.
    pub const ALL: [PipelineName; 4] = [
        PipelineName::NetsuiteToShopify,
        PipelineName::NetsuiteToZoey,
        PipelineName::ShopifyToZoey,
        PipelineName::NetsuiteFileToShopify,
    ];

    /// Command-line name.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineName::NetsuiteToShopify => "netsuite-to-shopify",
            PipelineName::NetsuiteToZoey => "netsuite-to-zoey",
            PipelineName::ShopifyToZoey => "shopify-to-zoey",
            PipelineName::NetsuiteFileToShopify => "netsuite-file-to-shopify",
        }
    }

    /// Source stage.
    pub fn source(self) -> SourceKind {
        match self {
            PipelineName::NetsuiteToShopify | PipelineName::NetsuiteToZoey => {
                SourceKind::Api(Platform::NetSuite)
            }
            PipelineName::ShopifyToZoey => SourceKind::File(Platform::Shopify),
            PipelineName::NetsuiteFileToShopify => SourceKind::File(Platform::NetSuite),
        }
    }

    /// Delivery stage.
    pub fn target(self) -> TargetKind {
        match self {
            PipelineName::NetsuiteToShopify | PipelineName::NetsuiteFileToShopify => {
                TargetKind::File(Platform::Shopify)
            }
            PipelineName::NetsuiteToZoey | PipelineName::ShopifyToZoey => {
                TargetKind::Api(Platform::Zoey)
            }
        }
    }

    fn available() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineName {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| SyncError::UnknownPipeline {
                name: s.to_string(),
                available: Self::available(),
            })
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    /// Every record was delivered.
    Completed,
    /// A stage failed or produced nothing; delivery was not attempted.
    Aborted,
    /// Delivery started and failed.
    DeliveryFailed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncStatus::Completed => "completed",
            SyncStatus::Aborted => "aborted",
            SyncStatus::DeliveryFailed => "delivery failed",
        })
    }
}

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Reading the source.
    Fetch,
    /// Normalizing into canonical products.
    Normalize,
    /// Mapping into the target shape.
    Map,
    /// Delivering to the target.
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::Map => "map",
            Stage::Deliver => "deliver",
        })
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Stage.
    pub stage: Stage,
    /// Records the stage produced.
    pub records: usize,
    /// Failure message, if the stage failed.
    pub error: Option<String>,
}

/// Everything observable about one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Pipeline run.
    pub pipeline: PipelineName,
    /// Unique id of this run, also attached to every log line.
    pub run_id: Uuid,
    /// Final status.
    pub status: SyncStatus,
    /// Why the run did not complete.
    pub reason: Option<String>,
    /// Raw records read from the source.
    pub fetched: usize,
    /// Canonical records after normalization.
    pub normalized: usize,
    /// Raw records dropped for missing sku or title.
    pub dropped: usize,
    /// Records accepted by the destination.
    pub delivered: usize,
    /// Normalization warnings.
    pub warnings: Vec<String>,
    /// Per-stage outcomes in execution order.
    pub stages: Vec<StageReport>,
    /// Wall time of the run.
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

impl SyncReport {
    fn start(pipeline: PipelineName) -> Self {
        Self {
            pipeline,
            run_id: Uuid::new_v4(),
            status: SyncStatus::Aborted,
            reason: None,
            fetched: 0,
            normalized: 0,
            dropped: 0,
            delivered: 0,
            warnings: Vec::new(),
            stages: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the run completed.
    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Completed
    }

    fn stage(&mut self, stage: Stage, records: usize) {
        self.stages.push(StageReport {
            stage,
            records,
            error: None,
        });
    }

    fn halt(&mut self, stage: Stage, status: SyncStatus, reason: String) {
        self.stages.push(StageReport {
            stage,
            records: 0,
            error: Some(reason.clone()),
        });
        self.status = status;
        self.reason = Some(reason);
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} (fetched {}, normalized {}, dropped {}, delivered {}, {} ms)",
            self.pipeline,
            self.run_id,
            self.status,
            self.fetched,
            self.normalized,
            self.dropped,
            self.delivered,
            self.duration.as_millis()
        )?;
        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

/// Counts of an offline conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Rows read.
    pub read: usize,
    /// Rows dropped for missing sku or title.
    pub dropped: usize,
    /// Rows written.
    pub written: usize,
    /// Normalization warnings.
    pub warnings: Vec<String>,
}

/// Runs named pipelines.
pub struct Orchestrator<C: HttpClient> {
    config: SyncConfig,
    credentials: Credentials,
    transport: Transport<C>,
}

impl Orchestrator<UreqClient> {
    /// Creates an orchestrator talking to real endpoints.
    pub fn connect(config: SyncConfig, credentials: Credentials) -> Self {
        let client = UreqClient::new(config.timeout);
        Self::new(config, credentials, client)
    }
}

impl<C: HttpClient> Orchestrator<C> {
    /// Creates an orchestrator with an explicit HTTP client.
    pub fn new(config: SyncConfig, credentials: Credentials, client: C) -> Self {
        let transport = Transport::new(client, config.retry.clone());
        Self {
            config,
            credentials,
            transport,
        }
    }

    /// Runs a pipeline by name.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownPipeline`] for an unknown name. Every
    /// other failure is reported in the [`SyncReport`].
    pub fn run_named(&self, name: &str) -> SyncResult<SyncReport> {
        Ok(self.run(name.parse()?))
    }

    /// Runs a pipeline to completion and reports the outcome. Never panics
    /// on stage failures and never delivers a partial set.
    pub fn run(&self, pipeline: PipelineName) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport::start(pipeline);
        let span = info_span!("sync", pipeline = %pipeline, run_id = %report.run_id);
        let _guard = span.enter();

        info!(
            source = %pipeline.source(),
            target = %pipeline.target(),
            "pipeline started"
        );
        self.execute(pipeline, &mut report);
        report.duration = started.elapsed();

        match report.status {
            SyncStatus::Completed => info!(
                delivered = report.delivered,
                dropped = report.dropped,
                elapsed_ms = report.duration.as_millis() as u64,
                "pipeline completed"
            ),
            status => error!(
                %status,
                reason = report.reason.as_deref().unwrap_or_default(),
                delivered = report.delivered,
                "pipeline halted"
            ),
        }
        report
    }

    fn execute(&self, pipeline: PipelineName, report: &mut SyncReport) {
        let source = pipeline.source();
        let target = pipeline.target();

        let raw = match self.read_source(source) {
            Ok(raw) => raw,
            Err(err) => return report.halt(Stage::Fetch, SyncStatus::Aborted, err.to_string()),
        };
        report.fetched = raw.len();
        if raw.is_empty() {
            let reason = format!("no records fetched from {source}");
            return report.halt(Stage::Fetch, SyncStatus::Aborted, reason);
        }
        report.stage(Stage::Fetch, raw.len());

        let canonical = match normalize(raw, source.platform().schema()) {
            Ok(canonical) => canonical,
            Err(err) => return report.halt(Stage::Normalize, SyncStatus::Aborted, err.to_string()),
        };
        report.normalized = canonical.len();
        report.dropped = canonical.report.dropped_count();
        report.warnings = canonical.report.warnings.clone();
        if canonical.is_empty() {
            let reason = format!(
                "no records left after normalization ({} dropped)",
                report.dropped
            );
            return report.halt(Stage::Normalize, SyncStatus::Aborted, reason);
        }
        report.stage(Stage::Normalize, canonical.len());

        let mapped = match Mapper::for_platform(target.platform()) {
            Ok(mapper) => mapper.map(&canonical),
            Err(err) => return report.halt(Stage::Map, SyncStatus::Aborted, err.to_string()),
        };
        drop(canonical);
        if mapped.is_empty() {
            let reason = "no records left after mapping".to_string();
            return report.halt(Stage::Map, SyncStatus::Aborted, reason);
        }
        report.stage(Stage::Map, mapped.len());

        let deliverer = self.deliverer(target);
        info!(target = %deliverer.describe(), records = mapped.len(), "delivering");
        match deliverer.deliver(&mapped) {
            Ok(delivered) => {
                report.delivered = delivered;
                report.stage(Stage::Deliver, delivered);
                report.status = SyncStatus::Completed;
            }
            Err(err) => {
                report.delivered = err.delivered();
                report.halt(Stage::Deliver, SyncStatus::DeliveryFailed, err.to_string());
            }
        }
    }

    fn read_source(&self, source: SourceKind) -> SyncResult<RawRecordSet> {
        match source {
            SourceKind::Api(platform) => {
                let url = match platform {
                    Platform::Zoey => &self.config.zoey_url,
                    _ => &self.config.netsuite_url,
                };
                let fetcher = PaginatedFetcher::new(&self.transport, platform)
                    .with_items_key(self.config.items_key.as_str());
                Ok(fetcher.fetch_all(
                    url,
                    self.credentials.token(platform),
                    self.config.page_size,
                )?)
            }
            SourceKind::File(platform) => {
                let path = match platform {
                    Platform::Shopify => &self.config.shopify_export,
                    _ => &self.config.netsuite_export,
                };
                FileSource::new(path, platform).read()
            }
        }
    }

    fn deliverer(&self, target: TargetKind) -> Box<dyn Deliver + '_> {
        match target {
            TargetKind::Api(platform) => Box::new(ApiExporter::new(
                &self.transport,
                self.config.zoey_url.clone(),
                self.credentials.token(platform),
            )),
            TargetKind::File(_) => Box::new(FileExporter::new(
                self.config.output_dir.clone(),
                self.config.export_format,
            )),
        }
    }
}

/// Converts a product file from one platform's layout to another's.
///
/// The output format follows the output file's extension.
///
/// # Errors
///
/// Fails if the input cannot be read or normalized, if nothing survives
/// normalization, or if the output cannot be written.
pub fn convert_file(
    input: &Path,
    from: Platform,
    to: Platform,
    output: &Path,
) -> SyncResult<ConversionSummary> {
    let format = output
        .extension()
        .and_then(|e| e.to_str())
        .map_or(Ok(ExportFormat::Csv), str::parse::<ExportFormat>)
        .map_err(|message| SyncError::Source {
            path: output.display().to_string(),
            message,
        })?;

    let raw = FileSource::new(input, from).read()?;
    let read = raw.len();
    let canonical = normalize(raw, from.schema())?;
    if canonical.report.dropped_count() > 0 {
        warn!(
            dropped = canonical.report.dropped_count(),
            "rows without sku or title were skipped"
        );
    }
    let mapped = Mapper::for_platform(to)?.map(&canonical);
    let written = FileExporter::new(".", format).write_to(&mapped, output)?;

    Ok(ConversionSummary {
        read,
        dropped: canonical.report.dropped_count(),
        written,
        warnings: canonical.report.warnings,
    })
}
