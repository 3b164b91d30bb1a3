//! Property-based test generators using proptest.
//!
//! Raw rows are generated with the ERP's plain column names (`sku`,
//! `displayName`, `basePrice`, ...) and deliberately messy cells: blanks,
//! nulls, unparsable numbers and markup.

use catsync_core::{
    CanonicalField, CanonicalProduct, CanonicalRecordSet, CellValue, Platform, ProductStatus,
    RawRecord, RawRecordSet,
};
use proptest::prelude::*;

/// Strategy for product titles, including spaces and slashes.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 /.-]{0,30}").expect("Invalid regex")
}

/// Strategy for arbitrary unicode text, handle derivation must cope with it.
pub fn any_text_strategy() -> impl Strategy<Value = String> {
    any::<String>()
}

/// Strategy for SKUs.
pub fn sku_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z]{1,3}-?[0-9]{1,6}").expect("Invalid regex")
}

/// Strategy for a key cell: present, blank or null.
pub fn key_cell_strategy(present: BoxedStrategy<String>) -> impl Strategy<Value = CellValue> {
    prop_oneof![
        6 => present.prop_map(CellValue::Text),
        1 => Just(CellValue::text("   ")),
        1 => Just(CellValue::Null),
    ]
}

/// Strategy for a price cell in any of the shapes sources produce.
pub fn price_cell_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        4 => (0u32..100_000).prop_map(|cents| CellValue::Number(f64::from(cents) / 100.0)),
        2 => (0u32..100_000).prop_map(|cents| CellValue::text(format!(" {}.{:02} ", cents / 100, cents % 100))),
        1 => Just(CellValue::text("N/A")),
        1 => Just(CellValue::Number(-1.0)),
        1 => Just(CellValue::Null),
    ]
}

/// Strategy for an inventory cell.
pub fn qty_cell_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        4 => (0i64..10_000).prop_map(CellValue::Integer),
        1 => (0i64..10_000).prop_map(|n| CellValue::text(n.to_string())),
        1 => Just(CellValue::text("lots")),
        1 => Just(CellValue::Null),
    ]
}

/// Strategy for a description cell, sometimes carrying markup.
pub fn description_cell_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        2 => "[a-z ]{0,20}".prop_map(CellValue::Text),
        2 => "[a-z ]{0,20}".prop_map(|s| CellValue::text(format!("<p><b>{s}</b></p>"))),
        1 => Just(CellValue::Null),
    ]
}

/// Strategy for one raw ERP row.
pub fn raw_record_strategy() -> impl Strategy<Value = RawRecord> {
    (
        key_cell_strategy(sku_strategy().boxed()),
        key_cell_strategy(title_strategy().boxed()),
        description_cell_strategy(),
        price_cell_strategy(),
        qty_cell_strategy(),
        prop::option::of("[A-Za-z]{1,10}"),
    )
        .prop_map(|(sku, title, description, price, qty, brand)| {
            RawRecord::new()
                .with("sku", sku)
                .with("displayName", title)
                .with("salesDescription", description)
                .with("basePrice", price)
                .with("quantityAvailable", qty)
                .with("brand", brand)
        })
}

/// Strategy for a raw record set of up to `max_rows` rows.
pub fn raw_set_strategy(max_rows: usize) -> impl Strategy<Value = RawRecordSet> {
    prop::collection::vec(raw_record_strategy(), 0..max_rows).prop_map(RawRecordSet::from_records)
}

/// Strategy for a canonical product with random defaulted flags.
pub fn canonical_product_strategy() -> impl Strategy<Value = CanonicalProduct> {
    (
        sku_strategy(),
        title_strategy(),
        prop::option::of("[A-Za-z]{1,10}"),
        prop::option::of(0.0f64..10_000.0),
        prop::option::of(0u64..10_000),
        any::<bool>(),
        prop_oneof![
            Just(ProductStatus::Active),
            Just(ProductStatus::Draft),
            Just(ProductStatus::Archived)
        ],
    )
        .prop_map(|(sku, title, vendor, price, qty, published, status)| {
            let mut product = CanonicalProduct::new(sku, title);
            match vendor {
                Some(vendor) => product.vendor = vendor,
                None => product.defaulted.insert(CanonicalField::Vendor),
            }
            match price {
                Some(price) => product.price = price,
                None => product.defaulted.insert(CanonicalField::Price),
            }
            match qty {
                Some(qty) => product.inventory_qty = qty,
                None => product.defaulted.insert(CanonicalField::InventoryQty),
            }
            product.published = published;
            product.status = status;
            product
        })
}

/// Strategy for a canonical record set of up to `max_rows` products.
pub fn canonical_set_strategy(max_rows: usize) -> impl Strategy<Value = CanonicalRecordSet> {
    prop::collection::vec(canonical_product_strategy(), 0..max_rows)
        .prop_map(|products| CanonicalRecordSet::from_products(Platform::NetSuite, products))
}

/// Strategy for a target platform.
pub fn platform_strategy() -> impl Strategy<Value = Platform> {
    prop::sample::select(Platform::ALL.to_vec())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
