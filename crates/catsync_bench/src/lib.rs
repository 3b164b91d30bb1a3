//! Benchmark utilities.

use catsync_core::{CellValue, RawRecord, RawRecordSet};

/// Generates ERP rows with markup in descriptions. Every tenth row lacks a
/// SKU and every seventh has no price.
pub fn erp_rows(count: usize) -> RawRecordSet {
    RawRecordSet::from_records(
        (0..count)
            .map(|i| {
                let sku = if i % 10 == 9 {
                    CellValue::Null
                } else {
                    CellValue::text(format!("SKU-{i:06}"))
                };
                let price = if i % 7 == 0 {
                    CellValue::Null
                } else {
                    CellValue::from(i as f64 * 1.25)
                };
                RawRecord::new()
                    .with("itemId", sku)
                    .with("displayName", format!("Product {i} / Large"))
                    .with(
                        "salesDescription",
                        format!("<div><p>Product <b>{i}</b> description</p></div>"),
                    )
                    .with("basePrice", price)
                    .with("quantityAvailable", (i % 50) as i64)
                    .with("brand", "Acme")
            })
            .collect(),
    )
}
