//! Canonical products to platform-shaped records.
//!
//! A single generic routine walks the target schema descriptor. There is no
//! per-platform mapping code: platform differences live entirely in the
//! descriptor tables.
//!
//! Defaulting precedence: when the normalizer flagged a field as defaulted,
//! the target descriptor's default wins over the normalizer's zero value.

use crate::error::CoreResult;
use crate::handle::derive_handle;
use crate::record::{CanonicalProduct, CanonicalRecordSet, FieldValue};
use crate::schema::{
    CanonicalField, DefaultValue, FieldDescriptor, FieldKind, FieldSource, Platform,
    PlatformSchema,
};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::info;

/// A typed value in a target record.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetValue {
    /// Text.
    Text(String),
    /// Decimal, always finite.
    Decimal(f64),
    /// Integer.
    Integer(i64),
    /// Boolean.
    Bool(bool),
}

impl TargetValue {
    /// Returns the text content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TargetValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the decimal value, widening integers.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            TargetValue::Decimal(d) => Some(*d),
            TargetValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TargetValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TargetValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Delimited-text rendering. Decimals use the shortest exact representation.
impl fmt::Display for TargetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetValue::Text(s) => f.write_str(s),
            TargetValue::Decimal(d) => write!(f, "{d}"),
            TargetValue::Integer(i) => write!(f, "{i}"),
            TargetValue::Bool(true) => f.write_str("TRUE"),
            TargetValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

impl Serialize for TargetValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TargetValue::Text(s) => serializer.serialize_str(s),
            TargetValue::Decimal(d) => serializer.serialize_f64(*d),
            TargetValue::Integer(i) => serializer.serialize_i64(*i),
            TargetValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// One platform-shaped row, parallel to [`TargetRecordSet::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    /// Values in column order.
    pub values: Vec<TargetValue>,
}

/// Platform-shaped rows with the schema's column order.
#[derive(Debug, Clone)]
pub struct TargetRecordSet {
    schema: &'static PlatformSchema,
    /// Rows in canonical input order.
    pub records: Vec<TargetRecord>,
}

impl TargetRecordSet {
    /// Target platform.
    pub fn platform(&self) -> Platform {
        self.schema.platform
    }

    /// Target schema.
    pub fn schema(&self) -> &'static PlatformSchema {
        self.schema
    }

    /// Column names in schema order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.schema.columns()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `column` in `record`.
    pub fn get<'a>(&self, record: &'a TargetRecord, column: &str) -> Option<&'a TargetValue> {
        let index = self.schema.fields.iter().position(|f| f.name == column)?;
        record.values.get(index)
    }

    /// Value fed by a canonical field in `record`.
    pub fn field<'a>(
        &self,
        record: &'a TargetRecord,
        field: CanonicalField,
    ) -> Option<&'a TargetValue> {
        record.values.get(self.schema.position(field)?)
    }

    /// Iterates over `(column, value)` pairs of a record.
    pub fn pairs<'a>(
        &self,
        record: &'a TargetRecord,
    ) -> impl Iterator<Item = (&'static str, &'a TargetValue)> + 'a {
        let schema = self.schema;
        schema.fields.iter().map(|f| f.name).zip(record.values.iter())
    }
}

/// Maps canonical products into one platform's shape.
#[derive(Debug, Clone, Copy)]
pub struct Mapper {
    schema: &'static PlatformSchema,
}

impl Mapper {
    /// Creates a mapper for a target schema.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Mapping`] if the schema cannot carry
    /// canonical records (no sku or title column, duplicate columns).
    pub fn new(schema: &'static PlatformSchema) -> CoreResult<Self> {
        schema.validate()?;
        Ok(Self { schema })
    }

    /// Creates a mapper for a built-in platform.
    pub fn for_platform(platform: Platform) -> CoreResult<Self> {
        Self::new(platform.schema())
    }

    /// Target schema.
    pub fn schema(&self) -> &'static PlatformSchema {
        self.schema
    }

    /// Maps every product. Row count in equals row count out.
    pub fn map(&self, records: &CanonicalRecordSet) -> TargetRecordSet {
        let rows: Vec<TargetRecord> = records.iter().map(|p| self.map_product(p)).collect();
        info!(
            source = %records.source,
            target = %self.schema.platform,
            records = rows.len(),
            "mapping completed"
        );
        TargetRecordSet {
            schema: self.schema,
            records: rows,
        }
    }

    /// Maps a single product.
    pub fn map_product(&self, product: &CanonicalProduct) -> TargetRecord {
        let values = self
            .schema
            .fields
            .iter()
            .map(|descriptor| map_field(descriptor, product))
            .collect();
        TargetRecord { values }
    }
}

/// Maps a canonical record set into the shape of `platform`.
pub fn map_records(
    records: &CanonicalRecordSet,
    platform: Platform,
) -> CoreResult<TargetRecordSet> {
    Ok(Mapper::for_platform(platform)?.map(records))
}

fn map_field(descriptor: &FieldDescriptor, product: &CanonicalProduct) -> TargetValue {
    let field = match descriptor.source {
        FieldSource::Constant(value) => return TargetValue::Text(value.to_string()),
        FieldSource::Canonical(field) => field,
    };

    if field == CanonicalField::Handle {
        return if product.handle.trim().is_empty() {
            TargetValue::Text(derive_handle(&product.title))
        } else {
            TargetValue::Text(derive_handle(&product.handle))
        };
    }

    let fallback = default_for(descriptor.default, field.kind());
    if product.defaulted.contains(field) {
        return fallback;
    }

    match product.get(field) {
        FieldValue::Text(s) if s.is_empty() && descriptor.default.is_meaningful() => fallback,
        FieldValue::Text(s) => TargetValue::Text(s.to_string()),
        FieldValue::Decimal(d) if d.is_finite() && d >= 0.0 => TargetValue::Decimal(d),
        FieldValue::Integer(i) => i64::try_from(i).map_or(fallback, TargetValue::Integer),
        FieldValue::Bool(b) => TargetValue::Bool(b),
        FieldValue::Decimal(_) => fallback,
    }
}

fn default_for(default: DefaultValue, kind: FieldKind) -> TargetValue {
    match (default, kind) {
        (DefaultValue::Text(s), _) => TargetValue::Text(s.to_string()),
        (DefaultValue::Decimal(d), _) => TargetValue::Decimal(d),
        (DefaultValue::Integer(i), _) => TargetValue::Integer(i),
        (DefaultValue::Bool(b), _) => TargetValue::Bool(b),
        (DefaultValue::Empty, FieldKind::Decimal) => TargetValue::Decimal(0.0),
        (DefaultValue::Empty, FieldKind::Integer) => TargetValue::Integer(0),
        (DefaultValue::Empty, FieldKind::Boolean) => TargetValue::Bool(false),
        (DefaultValue::Empty, FieldKind::Status) => TargetValue::Text("active".to_string()),
        (DefaultValue::Empty, FieldKind::Text | FieldKind::Html) => TargetValue::Text(String::new()),
    }
}
