//! # catsync core
//!
//! Platform-neutral product catalog model for catsync.
//!
//! This crate provides:
//! - Cell values and raw record sets as read from any source
//! - Static schema descriptors for the ERP and both storefronts
//! - The field normalizer (raw rows to canonical products)
//! - The platform mapper (canonical products to platform rows)
//! - Nested product documents for REST delivery
//!
//! ## Architecture
//!
//! Every platform is described by one ordered field table. Ingest reads that
//! table to find source columns; export reads it to emit columns in order with
//! platform defaults. Adding a platform means adding a table, not code.
//!
//! ## Key Invariants
//!
//! - A canonical product always has a non-blank sku and title
//! - Descriptions never contain markup
//! - `derive_handle` is idempotent
//! - Mapping preserves row count and order
//!
//! This crate performs no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod handle;
mod mapper;
mod normalize;
mod payload;
mod record;
mod schema;
mod value;

pub use error::{CoreError, CoreResult};
pub use handle::derive_handle;
pub use mapper::{map_records, Mapper, TargetRecord, TargetRecordSet, TargetValue};
pub use normalize::{normalize, strip_html};
pub use payload::{ImagePayload, ProductPayload, VariantPayload};
pub use record::{
    CanonicalProduct, CanonicalRecordSet, DroppedRow, FieldSet, FieldValue, NormalizationReport,
    ProductStatus, RawRecord, RawRecordSet,
};
pub use schema::{
    normalize_column_name, CanonicalField, DefaultValue, FieldDescriptor, FieldKind, FieldSource,
    Platform, PlatformSchema, NETSUITE_SCHEMA, SHOPIFY_SCHEMA, ZOEY_SCHEMA,
};
pub use value::CellValue;
