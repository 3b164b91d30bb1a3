//! Raw and canonical record sets.

use crate::handle::derive_handle;
use crate::schema::{CanonicalField, Platform};
use crate::value::CellValue;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One unnormalized row: column name to cell, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, CellValue)>,
}

impl RawRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell and returns the record (builder style).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a cell, replacing an existing one with the same column name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Returns the cell stored under the exact column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Iterates over `(column, cell)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no cells.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Ordered rows with heterogeneous, unnormalized column names.
///
/// Produced by a fetcher or file reader and consumed once by the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecordSet {
    columns: Vec<String>,
    records: Vec<RawRecord>,
}

impl RawRecordSet {
    /// Creates an empty set with a declared header.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Builds a set from records, deriving the header from first appearance.
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            set.push(record);
        }
        set
    }

    /// Appends a record. Unseen columns are added to the header.
    pub fn push(&mut self, record: RawRecord) {
        for (column, _) in record.iter() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.to_string());
            }
        }
        self.records.push(record);
    }

    /// Header in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in input order.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Consumes the set and returns its rows.
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Visible and purchasable.
    #[default]
    Active,
    /// Not yet published.
    Draft,
    /// Retired.
    Archived,
}

impl ProductStatus {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(format!("unknown product status `{other}`")),
        }
    }
}

/// A compact set of canonical fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u16);

impl FieldSet {
    /// Creates an empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds a field.
    pub fn insert(&mut self, field: CanonicalField) {
        self.0 |= field.bit();
    }

    /// Returns true if `field` is in the set.
    pub fn contains(&self, field: CanonicalField) -> bool {
        self.0 & field.bit() != 0
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates in canonical declaration order.
    pub fn iter(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        CanonicalField::ALL
            .into_iter()
            .filter(move |f| self.contains(*f))
    }
}

/// Borrowed view of one canonical field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Text-valued field.
    Text(&'a str),
    /// Decimal field.
    Decimal(f64),
    /// Integer field.
    Integer(u64),
    /// Boolean field.
    Bool(bool),
}

/// A platform-neutral product variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalProduct {
    /// URL-safe slug.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain-text description, never containing markup.
    pub description: String,
    /// Vendor.
    pub vendor: String,
    /// Product type.
    pub product_type: String,
    /// Comma-joined tags.
    pub tags: String,
    /// Whether the product is published.
    pub published: bool,
    /// Stock keeping unit.
    pub sku: String,
    /// Unit price, non-negative.
    pub price: f64,
    /// Units in stock.
    pub inventory_qty: u64,
    /// Barcode.
    pub barcode: String,
    /// Primary image URL.
    pub image_url: String,
    /// Primary image alt text.
    pub image_alt_text: String,
    /// Lifecycle status.
    pub status: ProductStatus,
    /// Fields whose value was filled by a default rather than read from the source.
    pub defaulted: FieldSet,
}

impl CanonicalProduct {
    /// Creates a product with the two mandatory fields and zero values elsewhere.
    pub fn new(sku: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            handle: derive_handle(&title),
            title,
            description: String::new(),
            vendor: String::new(),
            product_type: String::new(),
            tags: String::new(),
            published: false,
            sku: sku.into(),
            price: 0.0,
            inventory_qty: 0,
            barcode: String::new(),
            image_url: String::new(),
            image_alt_text: String::new(),
            status: ProductStatus::Active,
            defaulted: FieldSet::empty(),
        }
    }

    /// Sets the price.
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Sets the inventory quantity.
    #[must_use]
    pub fn with_inventory(mut self, qty: u64) -> Self {
        self.inventory_qty = qty;
        self
    }

    /// Sets the vendor.
    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Marks a field as defaulted.
    #[must_use]
    pub fn with_defaulted(mut self, field: CanonicalField) -> Self {
        self.defaulted.insert(field);
        self
    }

    /// Reads a field by name.
    pub fn get(&self, field: CanonicalField) -> FieldValue<'_> {
        match field {
            CanonicalField::Handle => FieldValue::Text(&self.handle),
            CanonicalField::Title => FieldValue::Text(&self.title),
            CanonicalField::Description => FieldValue::Text(&self.description),
            CanonicalField::Vendor => FieldValue::Text(&self.vendor),
            CanonicalField::ProductType => FieldValue::Text(&self.product_type),
            CanonicalField::Tags => FieldValue::Text(&self.tags),
            CanonicalField::Published => FieldValue::Bool(self.published),
            CanonicalField::Sku => FieldValue::Text(&self.sku),
            CanonicalField::Price => FieldValue::Decimal(self.price),
            CanonicalField::InventoryQty => FieldValue::Integer(self.inventory_qty),
            CanonicalField::Barcode => FieldValue::Text(&self.barcode),
            CanonicalField::ImageUrl => FieldValue::Text(&self.image_url),
            CanonicalField::ImageAltText => FieldValue::Text(&self.image_alt_text),
            CanonicalField::Status => FieldValue::Text(self.status.as_str()),
        }
    }
}

/// A raw row rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    /// Zero-based position in the raw input.
    pub index: usize,
    /// Mandatory fields that were missing.
    pub missing: Vec<CanonicalField>,
}

/// What the normalizer had to repair or reject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    /// Rows in the raw input.
    pub input_rows: usize,
    /// Rows dropped for missing sku or title.
    pub dropped: Vec<DroppedRow>,
    /// Fields with no source column, filled entirely with defaults.
    pub synthesized: Vec<CanonicalField>,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl NormalizationReport {
    /// Number of dropped rows.
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Normalized products in input order, plus the normalization report.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecordSet {
    /// Schema the products were read from.
    pub source: Platform,
    /// Products in input order.
    pub products: Vec<CanonicalProduct>,
    /// Normalization report.
    pub report: NormalizationReport,
}

impl CanonicalRecordSet {
    /// Wraps already-canonical products.
    pub fn from_products(source: Platform, products: Vec<CanonicalProduct>) -> Self {
        let report = NormalizationReport {
            input_rows: products.len(),
            ..NormalizationReport::default()
        };
        Self {
            source,
            products,
            report,
        }
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if there are no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Iterates over the products.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalProduct> {
        self.products.iter()
    }
}
