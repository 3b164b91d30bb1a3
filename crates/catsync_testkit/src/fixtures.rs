//! Canned rows, API pages and temporary source files.

use catsync_core::{CellValue, RawRecord, RawRecordSet};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Header of a storefront product export spreadsheet.
pub const SHOPIFY_EXPORT_HEADER: &str =
    "Handle,Title,Body (HTML),Vendor,Type,Tags,Published,Variant SKU,Variant Inventory Qty,Variant Price,Variant Barcode,Image Src,Image Alt Text,Status";

/// A small storefront export with one good row, one row without a SKU
/// and one with markup and an unparsable price.
pub const SHOPIFY_EXPORT_CSV: &str = "\
Handle,Title,Body (HTML),Vendor,Type,Tags,Published,Variant SKU,Variant Inventory Qty,Variant Price,Variant Barcode,Image Src,Image Alt Text,Status
blue-mug,Blue Mug,<p>A <b>blue</b> mug</p>,Acme,Kitchen,mugs,TRUE,MUG-1,12,8.50,0001,https://cdn.example/mug.png,A blue mug,active
ghost,Ghost Item,nothing here,Acme,Kitchen,,TRUE,,1,1.00,,,,active
tea-pot,Tea Pot,<div>Large</div>,,,,FALSE,POT-2,3,call us,,,,draft
";

/// One ERP item as returned by the items API.
pub fn erp_item(sku: &str, title: &str, price: f64) -> Value {
    json!({
        "itemId": sku,
        "displayName": title,
        "salesDescription": format!("<p>{title}</p>"),
        "basePrice": price,
        "quantityAvailable": 5,
        "brand": "Acme",
    })
}

/// `count` distinct ERP items starting at `start`.
pub fn erp_items(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| erp_item(&format!("SKU-{i}"), &format!("Item {i}"), i as f64 + 0.5))
        .collect()
}

/// Body of one items API page.
pub fn erp_page(items: Vec<Value>) -> String {
    json!({ "items": items }).to_string()
}

/// Body of an empty items API page.
pub fn empty_page() -> String {
    erp_page(Vec::new())
}

/// Two ERP rows: a complete widget and a `Widget/Pro` without a price.
pub fn sample_erp_rows() -> RawRecordSet {
    RawRecordSet::from_records(vec![
        RawRecord::new()
            .with("sku", "W1")
            .with("title", "Widget")
            .with("price", 9.99)
            .with("description", "<p>Hi</p>"),
        RawRecord::new()
            .with("sku", "W2")
            .with("title", "Widget/Pro")
            .with("price", CellValue::Null)
            .with("description", "Plain"),
    ])
}

/// A temporary directory holding source files. Removed on drop.
pub struct TempFiles {
    dir: TempDir,
}

impl TempFiles {
    /// Creates an empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` inside the directory and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }

    /// Returns the path of `name` inside the directory without creating it.
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for TempFiles {
    fn default() -> Self {
        Self::new()
    }
}
