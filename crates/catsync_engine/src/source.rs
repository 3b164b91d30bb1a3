//! Tabular file sources.
//!
//! CSV files and workbooks need a header row; any casing or spacing of
//! column names is fine since the normalizer converges them. Only the first
//! worksheet of a workbook is read. JSON files hold either an array of
//! objects or an `{"items": [...]}` document.

use crate::error::SyncError;
use calamine::{Data, Reader, Xlsx};
use catsync_core::{CellValue, CoreError, Platform, RawRecord, RawRecordSet};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

/// Supported source file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array or items document.
    Json,
    /// Office Open XML workbook.
    Xlsx,
}

impl SourceFormat {
    /// Detects the format of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Normalization`] for any other extension.
    pub fn detect(path: &Path, platform: Platform) -> Result<Self, CoreError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" | "txt" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "xlsx" | "xlsm" => Ok(SourceFormat::Xlsx),
            other => Err(CoreError::normalization(
                platform,
                format!(
                    "unsupported source file extension `.{other}` (expected .csv, .json or .xlsx)"
                ),
            )),
        }
    }
}

/// A file holding one platform's product export.
#[derive(Debug, Clone)]
pub struct FileSource<'a> {
    path: &'a Path,
    platform: Platform,
}

impl<'a> FileSource<'a> {
    /// Creates a source for `path` laid out in `platform`'s schema.
    pub fn new(path: &'a Path, platform: Platform) -> Self {
        Self { path, platform }
    }

    /// Reads every row.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Source`] if the file cannot be opened and
    /// [`SyncError::Core`] if its content is not a table.
    pub fn read(&self) -> Result<RawRecordSet, SyncError> {
        let format = SourceFormat::detect(self.path, self.platform)?;
        let file = File::open(self.path).map_err(|e| SyncError::Source {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let reader = BufReader::new(file);
        let records = match format {
            SourceFormat::Csv => read_csv(reader, self.platform)?,
            SourceFormat::Json => read_json(reader, self.platform)?,
            SourceFormat::Xlsx => read_xlsx(reader, self.platform)?,
        };
        info!(
            path = %self.path.display(),
            platform = %self.platform,
            records = records.len(),
            "source file read"
        );
        Ok(records)
    }
}

/// Reads a CSV table with a header row. Empty cells become nulls.
pub fn read_csv<R: Read>(reader: R, platform: Platform) -> Result<RawRecordSet, CoreError> {
    let unreadable =
        |e: csv::Error| CoreError::normalization(platform, format!("unreadable CSV: {e}"));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::normalization(platform, "missing header row"));
    }

    let mut set = RawRecordSet::with_columns(headers.clone());
    for row in reader.records() {
        let row = row.map_err(unreadable)?;
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| {
                let value = if cell.trim().is_empty() {
                    CellValue::Null
                } else {
                    CellValue::text(cell)
                };
                (column.as_str(), value)
            })
            .collect::<RawRecord>();
        set.push(record);
    }
    Ok(set)
}

/// Reads a JSON array of objects or an `{"items": [...]}` document.
pub fn read_json<R: Read>(reader: R, platform: Platform) -> Result<RawRecordSet, CoreError> {
    let invalid = |reason: String| CoreError::normalization(platform, reason);
    let document: Value =
        serde_json::from_reader(reader).map_err(|e| invalid(format!("unreadable JSON: {e}")))?;
    let items = match &document {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(invalid("expected an array or an `items` array".to_string())),
        },
        _ => return Err(invalid("expected an array or an `items` array".to_string())),
    };

    let mut set = RawRecordSet::default();
    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(invalid(format!("row {index} is not an object")));
        };
        set.push(
            fields
                .iter()
                .map(|(k, v)| (k.as_str(), CellValue::from_json(v)))
                .collect(),
        );
    }
    Ok(set)
}

/// Reads the first worksheet of an xlsx workbook. The first row is the
/// header; fully empty rows are skipped.
pub fn read_xlsx<R: Read + Seek>(reader: R, platform: Platform) -> Result<RawRecordSet, CoreError> {
    let unreadable = |e: calamine::XlsxError| {
        CoreError::normalization(platform, format!("unreadable spreadsheet: {e}"))
    };
    let mut workbook: Xlsx<R> = Xlsx::new(reader).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CoreError::normalization(platform, "workbook has no worksheets"))?
        .map_err(unreadable)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::normalization(platform, "missing header row"));
    }

    let mut set = RawRecordSet::with_columns(
        headers.iter().filter(|h| !h.is_empty()).cloned().collect(),
    );
    let mut skipped = 0usize;
    for row in rows {
        let record = headers
            .iter()
            .zip(row.iter())
            .filter(|(column, _)| !column.is_empty())
            .map(|(column, cell)| (column.as_str(), excel_cell(cell)))
            .collect::<RawRecord>();
        if record.iter().all(|(_, value)| value.is_null()) {
            skipped += 1;
            continue;
        }
        set.push(record);
    }
    if skipped > 0 {
        debug!(skipped, "skipped empty worksheet rows");
    }
    Ok(set)
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}
