//! Delivery of mapped records to their destination.

use crate::config::ExportFormat;
use crate::credentials::ApiToken;
use crate::error::{excerpt, DeliveryError};
use crate::transport::{HttpClient, HttpRequest, Transport};
use catsync_core::{Platform, ProductPayload, TargetRecord, TargetRecordSet, TargetValue};
use rust_xlsxwriter::Workbook;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// A pipeline's final stage.
pub trait Deliver {
    /// Short description used in reports, e.g. `zoey api`.
    fn describe(&self) -> String;

    /// Delivers every record and returns how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::EmptyInput`] for an empty set, and the first
    /// failure otherwise. Nothing after a failure is delivered.
    fn deliver(&self, records: &TargetRecordSet) -> Result<usize, DeliveryError>;
}

/// Posts one JSON product document per record to a REST endpoint.
pub struct ApiExporter<'a, C: HttpClient> {
    transport: &'a Transport<C>,
    endpoint: String,
    credential: Option<&'a ApiToken>,
}

impl<'a, C: HttpClient> ApiExporter<'a, C> {
    /// Creates an exporter for `endpoint`.
    pub fn new(
        transport: &'a Transport<C>,
        endpoint: impl Into<String>,
        credential: Option<&'a ApiToken>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            credential,
        }
    }
}

impl<C: HttpClient> Deliver for ApiExporter<'_, C> {
    fn describe(&self) -> String {
        format!("api {}", self.endpoint)
    }

    fn deliver(&self, records: &TargetRecordSet) -> Result<usize, DeliveryError> {
        if records.is_empty() {
            return Err(DeliveryError::EmptyInput);
        }
        let platform = records.platform();
        let token = self
            .credential
            .ok_or(DeliveryError::MissingCredential { platform })?;

        let mut delivered = 0;
        for payload in ProductPayload::from_set(records) {
            let label = match payload.variants.first() {
                Some(variant) if payload.title.is_empty() => variant.sku.clone(),
                _ => payload.title.clone(),
            };
            let body = serde_json::to_vec(&payload).map_err(|e| DeliveryError::Io {
                path: self.endpoint.clone(),
                message: e.to_string(),
            })?;
            let request = HttpRequest::post(&self.endpoint)
                .header("Authorization", token.bearer())
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .json_body(body);

            let response = self.transport.send(&request).map_err(|source| {
                error!(%platform, product = %label, error = %source, "product upload failed");
                DeliveryError::Transport { source, delivered }
            })?;
            if !matches!(response.status, 200 | 201) {
                error!(
                    %platform,
                    product = %label,
                    status = response.status,
                    "product rejected"
                );
                return Err(DeliveryError::Rejected {
                    record: label,
                    status: response.status,
                    body: excerpt(&response.body),
                    delivered,
                });
            }
            debug!(%platform, product = %label, "product exported");
            delivered += 1;
        }

        info!(%platform, records = delivered, endpoint = %self.endpoint, "api delivery completed");
        Ok(delivered)
    }
}

/// Writes records to `<output_dir>/<platform>_import.<ext>`.
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    format: ExportFormat,
}

impl FileExporter {
    /// Creates an exporter writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Path the export for `platform` is written to.
    pub fn target_path(&self, platform: Platform) -> PathBuf {
        self.output_dir
            .join(format!("{}_import.{}", platform, self.format.extension()))
    }

    /// Writes `records` to an explicit path.
    ///
    /// The export is written to a temporary file next to `path` and moved
    /// into place once complete, so a failed write never leaves a truncated
    /// file behind.
    pub fn write_to(&self, records: &TargetRecordSet, path: &Path) -> Result<usize, DeliveryError> {
        if records.is_empty() {
            return Err(DeliveryError::EmptyInput);
        }
        let io_error = |message: String| DeliveryError::Io {
            path: path.display().to_string(),
            message,
        };
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| io_error(e.to_string()))?;
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| io_error(e.to_string()))?;

        match self.format {
            ExportFormat::Csv => {
                write_csv(records, &mut staged).map_err(|e| io_error(e.to_string()))?
            }
            ExportFormat::Json => write_json_lines(records, &mut staged).map_err(io_error)?,
            ExportFormat::Excel => write_xlsx(records, &mut staged).map_err(io_error)?,
        }
        staged.persist(path).map_err(|e| io_error(e.error.to_string()))?;
        info!(
            platform = %records.platform(),
            records = records.len(),
            path = %path.display(),
            format = %self.format,
            "file export completed"
        );
        Ok(records.len())
    }
}

impl Deliver for FileExporter {
    fn describe(&self) -> String {
        format!("{} file in {}", self.format, self.output_dir.display())
    }

    fn deliver(&self, records: &TargetRecordSet) -> Result<usize, DeliveryError> {
        self.write_to(records, &self.target_path(records.platform()))
    }
}

/// Writes a header row in schema order, then one row per record.
pub fn write_csv<W: Write>(records: &TargetRecordSet, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(records.columns())?;
    for record in &records.records {
        writer.write_record(record.values.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one JSON object per line, keys in schema order.
pub fn write_json_lines<W: Write>(records: &TargetRecordSet, writer: W) -> Result<(), String> {
    let mut writer = BufWriter::new(writer);
    for record in &records.records {
        serde_json::to_writer(&mut writer, &OrderedRow { records, record })
            .map_err(|e| e.to_string())?;
        writer.write_all(b"\n").map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

/// Writes a single-sheet workbook: a header row in schema order, then one
/// row per record. Numbers and booleans keep their cell types; empty text
/// is left blank.
pub fn write_xlsx<W: Write>(records: &TargetRecordSet, mut writer: W) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in records.columns().iter().enumerate() {
        let col = u16::try_from(col).map_err(|e| e.to_string())?;
        sheet.write_string(0, col, *name).map_err(|e| e.to_string())?;
    }
    for (index, record) in records.records.iter().enumerate() {
        let row = index
            .checked_add(1)
            .and_then(|r| u32::try_from(r).ok())
            .ok_or_else(|| format!("row {index} exceeds the worksheet limit"))?;
        for (col, value) in record.values.iter().enumerate() {
            let col = u16::try_from(col).map_err(|e| e.to_string())?;
            let written = match value {
                TargetValue::Text(s) if s.is_empty() => continue,
                TargetValue::Text(s) => sheet.write_string(row, col, s.as_str()),
                TargetValue::Decimal(d) => sheet.write_number(row, col, *d),
                TargetValue::Integer(i) => sheet.write_number(row, col, *i as f64),
                TargetValue::Bool(b) => sheet.write_boolean(row, col, *b),
            };
            written.map_err(|e| e.to_string())?;
        }
    }
    let buffer = workbook.save_to_buffer().map_err(|e| e.to_string())?;
    writer.write_all(&buffer).map_err(|e| e.to_string())?;
    writer.flush().map_err(|e| e.to_string())
}

struct OrderedRow<'a> {
    records: &'a TargetRecordSet,
    record: &'a TargetRecord,
}

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.values.len()))?;
        for (column, value) in self.records.pairs(self.record) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_xlsx;
    use catsync_core::{
        map_records, normalize, CanonicalProduct, CanonicalRecordSet, CellValue, SHOPIFY_SCHEMA,
    };
    use catsync_testkit::TempFiles;
    use std::fs::File;

    fn mapped(platform: Platform) -> TargetRecordSet {
        let set = CanonicalRecordSet::from_products(
            Platform::NetSuite,
            vec![
                CanonicalProduct::new("W1", "Widget").with_price(9.99).with_inventory(3),
                CanonicalProduct::new("W2", "Widget, \"Pro\"").with_price(0.1 + 0.2),
            ],
        );
        map_records(&set, platform).unwrap()
    }

    #[test]
    fn csv_preserves_column_order_and_values() {
        let mut out = Vec::new();
        write_csv(&mapped(Platform::Shopify), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Handle,Title,Body (HTML),Vendor,Type"));
        let first = lines.next().unwrap();
        assert!(first.starts_with(
            "widget,Widget,,Unknown,Product,,FALSE,Title,Default Title,W1,3,deny,manual,9.99,TRUE"
        ));
        let second = lines.next().unwrap();
        assert!(second.contains("\"Widget, \"\"Pro\"\"\""));
        assert!(second.contains(",0.30000000000000004,"));
    }

    #[test]
    fn json_lines_keep_schema_order() {
        let mut out = Vec::new();
        write_json_lines(&mapped(Platform::Zoey), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with(r#"{"Handle":"widget","Title":"Widget","Description":"#));
        let row: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(row["Price"], 9.99);
        assert_eq!(row["Inventory Quantity"], 3);
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn file_exporter_names_files_by_platform() {
        let files = TempFiles::new();
        let exporter = FileExporter::new(files.join("nested/out"), ExportFormat::Csv);
        let delivered = exporter.deliver(&mapped(Platform::Shopify)).unwrap();
        assert_eq!(delivered, 2);
        let path = files.join("nested/out/shopify_import.csv");
        assert!(path.exists());
        assert_eq!(fs::read_to_string(path).unwrap().lines().count(), 3);
    }

    #[test]
    fn workbook_export_keeps_column_order_and_cell_types() {
        let files = TempFiles::new();
        let exporter = FileExporter::new(files.path(), ExportFormat::Excel);
        let records = mapped(Platform::Shopify);
        assert_eq!(exporter.deliver(&records).unwrap(), 2);

        let path = files.join("shopify_import.xlsx");
        let set = read_xlsx(File::open(&path).unwrap(), Platform::Shopify).unwrap();

        assert_eq!(set.columns(), records.columns());
        assert_eq!(set.len(), 2);
        let first = &set.records()[0];
        assert_eq!(first.get("Handle"), Some(&CellValue::text("widget")));
        assert_eq!(first.get("Variant Price"), Some(&CellValue::Number(9.99)));
        assert_eq!(first.get("Published"), Some(&CellValue::Bool(false)));
        assert_eq!(first.get("Variant Inventory Policy"), Some(&CellValue::text("deny")));
        assert_eq!(first.get("Tags"), Some(&CellValue::Null));

        let products = normalize(set, &SHOPIFY_SCHEMA).unwrap();
        assert_eq!(products.len(), 2);
        let skus: Vec<&str> = products.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["W1", "W2"]);
        assert_eq!(products.iter().next().map(|p| p.inventory_qty), Some(3));
    }

    #[test]
    fn failed_export_leaves_no_partial_file() {
        let files = TempFiles::new();
        let out = files.join("out");
        // A directory squatting on the target path makes the final move fail.
        fs::create_dir_all(out.join("shopify_import.csv")).unwrap();
        let exporter = FileExporter::new(&out, ExportFormat::Csv);

        let err = exporter.deliver(&mapped(Platform::Shopify)).unwrap_err();

        assert!(matches!(err, DeliveryError::Io { .. }), "{err}");
        let entries: Vec<_> = fs::read_dir(&out).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(out.join("shopify_import.csv").is_dir());
    }

    #[test]
    fn export_replaces_previous_file() {
        let files = TempFiles::new();
        let path = files.join("shopify_import.csv");
        fs::write(&path, "stale").unwrap();
        let exporter = FileExporter::new(files.path(), ExportFormat::Csv);

        exporter.deliver(&mapped(Platform::Shopify)).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Handle,"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn refuses_empty_input() {
        let empty = map_records(
            &CanonicalRecordSet::from_products(Platform::NetSuite, Vec::new()),
            Platform::Shopify,
        )
        .unwrap();
        let files = TempFiles::new();
        let exporter = FileExporter::new(files.path(), ExportFormat::Csv);
        assert!(matches!(exporter.deliver(&empty), Err(DeliveryError::EmptyInput)));
        assert!(!exporter.target_path(Platform::Shopify).exists());
    }
}
