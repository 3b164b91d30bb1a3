//! Field normalizer: raw tabular input to canonical products.
//!
//! Normalization runs in a fixed order per row:
//! 1. Resolve source columns against the schema descriptor (name or alias,
//!    after column-name normalization). Absent columns are synthesized.
//! 2. Drop rows whose sku or title is missing or blank.
//! 3. Coerce typed cells. Unparsable values become null.
//! 4. Fill nulls with the field-kind default and flag the field as defaulted.
//!
//! Coercion always precedes defaulting, so a bad price string is treated as
//! missing instead of aborting the row.

use crate::error::{CoreError, CoreResult};
use crate::handle::derive_handle;
use crate::record::{
    CanonicalProduct, CanonicalRecordSet, DroppedRow, FieldSet, NormalizationReport,
    ProductStatus, RawRecord, RawRecordSet,
};
use crate::schema::{normalize_column_name, CanonicalField, PlatformSchema};
use crate::value::CellValue;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid HTML tag pattern"));

/// Removes markup tags and trims surrounding whitespace.
pub fn strip_html(input: &str) -> String {
    HTML_TAG.replace_all(input, "").trim().to_string()
}

/// Source columns resolved for each canonical field.
#[derive(Debug, Default)]
struct ColumnMap {
    columns: [Vec<String>; 14],
}

impl ColumnMap {
    fn resolve(raw: &RawRecordSet, schema: &PlatformSchema) -> Self {
        let normalized: Vec<(String, &String)> = raw
            .columns()
            .iter()
            .map(|c| (normalize_column_name(c), c))
            .collect();

        let mut map = ColumnMap::default();
        for descriptor in schema.fields {
            let Some(field) = descriptor.canonical() else {
                continue;
            };
            // First ingest name with any match wins; every raw column that
            // normalizes to it is kept so casing variants converge.
            for name in descriptor.ingest_names() {
                let hits: Vec<String> = normalized
                    .iter()
                    .filter(|(n, _)| *n == name)
                    .map(|(_, raw)| (*raw).clone())
                    .collect();
                if !hits.is_empty() {
                    map.columns[field as usize] = hits;
                    break;
                }
            }
        }
        map
    }

    fn has(&self, field: CanonicalField) -> bool {
        !self.columns[field as usize].is_empty()
    }

    /// First non-null cell among the columns feeding `field`.
    fn cell<'r>(&self, record: &'r RawRecord, field: CanonicalField) -> &'r CellValue {
        self.columns[field as usize]
            .iter()
            .filter_map(|c| record.get(c))
            .find(|v| !v.is_null())
            .unwrap_or(&CellValue::Null)
    }
}

/// Normalizes a raw record set against a platform schema.
///
/// Consumes the raw set and returns a new canonical set in input order.
/// Rows missing sku or title are dropped and listed in the report.
///
/// # Errors
///
/// Returns [`CoreError::Normalization`] if the input has rows but no header.
pub fn normalize(raw: RawRecordSet, schema: &PlatformSchema) -> CoreResult<CanonicalRecordSet> {
    let platform = schema.platform;
    if raw.columns().is_empty() && !raw.is_empty() {
        return Err(CoreError::normalization(platform, "input has no header columns"));
    }

    let columns = ColumnMap::resolve(&raw, schema);
    let mut report = NormalizationReport {
        input_rows: raw.len(),
        ..NormalizationReport::default()
    };

    for field in CanonicalField::ALL {
        if columns.has(field) {
            continue;
        }
        report.synthesized.push(field);
        match schema.descriptor(field) {
            Some(descriptor) if descriptor.required => {
                let message = format!(
                    "column `{}` not found in {platform} input; filled with defaults",
                    descriptor.name
                );
                warn!(platform = %platform, column = descriptor.name, "required column missing, synthesizing defaults");
                report.warnings.push(message);
            }
            _ => debug!(platform = %platform, field = %field, "optional column missing"),
        }
    }

    let mut products = Vec::with_capacity(raw.len());
    for (index, record) in raw.into_records().into_iter().enumerate() {
        let sku = key_text(columns.cell(&record, CanonicalField::Sku));
        let title = key_text(columns.cell(&record, CanonicalField::Title));

        let (sku, title) = match (sku, title) {
            (Some(sku), Some(title)) => (sku, title),
            (sku, title) => {
                let mut missing = Vec::new();
                if sku.is_none() {
                    missing.push(CanonicalField::Sku);
                }
                if title.is_none() {
                    missing.push(CanonicalField::Title);
                }
                debug!(row = index, ?missing, "dropping row without mandatory fields");
                report.dropped.push(DroppedRow { index, missing });
                continue;
            }
        };

        products.push(build_product(&columns, &record, sku, title));
    }

    if !report.dropped.is_empty() {
        warn!(
            platform = %platform,
            dropped = report.dropped.len(),
            "rows dropped for missing sku or title"
        );
    }
    info!(
        platform = %platform,
        input = report.input_rows,
        output = products.len(),
        "normalization completed"
    );

    Ok(CanonicalRecordSet {
        source: platform,
        products,
        report,
    })
}

fn key_text(cell: &CellValue) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    cell.to_text().map(|s| s.trim().to_string())
}

fn build_product(
    columns: &ColumnMap,
    record: &RawRecord,
    sku: String,
    title: String,
) -> CanonicalProduct {
    let mut defaulted = FieldSet::empty();
    let mut text = |field: CanonicalField| -> String {
        match columns.cell(record, field).to_text() {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                defaulted.insert(field);
                String::new()
            }
        }
    };

    let vendor = text(CanonicalField::Vendor);
    let product_type = text(CanonicalField::ProductType);
    let tags = text(CanonicalField::Tags);
    let barcode = text(CanonicalField::Barcode);
    let image_url = text(CanonicalField::ImageUrl);
    let image_alt_text = text(CanonicalField::ImageAltText);
    let raw_handle = text(CanonicalField::Handle);

    let handle = if raw_handle.is_empty() {
        derive_handle(&title)
    } else {
        derive_handle(&raw_handle)
    };

    let description = match columns.cell(record, CanonicalField::Description).to_text() {
        Some(s) => strip_html(&s),
        None => {
            defaulted.insert(CanonicalField::Description);
            String::new()
        }
    };

    let price = columns
        .cell(record, CanonicalField::Price)
        .to_decimal()
        .filter(|p| *p >= 0.0)
        .unwrap_or_else(|| {
            defaulted.insert(CanonicalField::Price);
            0.0
        });

    let inventory_qty = columns
        .cell(record, CanonicalField::InventoryQty)
        .to_integer()
        .and_then(|q| u64::try_from(q).ok())
        .unwrap_or_else(|| {
            defaulted.insert(CanonicalField::InventoryQty);
            0
        });

    let published = columns
        .cell(record, CanonicalField::Published)
        .to_bool()
        .unwrap_or_else(|| {
            defaulted.insert(CanonicalField::Published);
            false
        });

    let status = columns
        .cell(record, CanonicalField::Status)
        .as_text()
        .and_then(|s| s.parse::<ProductStatus>().ok())
        .unwrap_or_else(|| {
            defaulted.insert(CanonicalField::Status);
            ProductStatus::Active
        });

    CanonicalProduct {
        handle,
        title,
        description,
        vendor,
        product_type,
        tags,
        published,
        sku,
        price,
        inventory_qty,
        barcode,
        image_url,
        image_alt_text,
        status,
        defaulted,
    }
}
