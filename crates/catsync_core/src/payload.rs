//! Nested product documents for REST delivery.

use crate::mapper::{TargetRecord, TargetRecordSet, TargetValue};
use crate::schema::CanonicalField;
use serde::Serialize;

/// One product as posted to a storefront API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPayload {
    /// URL-safe slug.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain-text description.
    pub description: String,
    /// Vendor.
    pub vendor: String,
    /// Product type.
    #[serde(rename = "type")]
    pub product_type: String,
    /// Comma-joined tags.
    pub tags: String,
    /// Whether the product is published.
    pub published: bool,
    /// Purchasable variants. Always exactly one.
    pub variants: Vec<VariantPayload>,
    /// Images. Empty when the product has no image URL.
    pub images: Vec<ImagePayload>,
}

/// Variant part of a [`ProductPayload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPayload {
    /// Stock keeping unit.
    pub sku: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub inventory_quantity: i64,
    /// Barcode.
    pub barcode: String,
}

/// Image part of a [`ProductPayload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    /// Image URL.
    pub src: String,
    /// Alt text.
    pub alt_text: String,
}

impl ProductPayload {
    /// Builds the document for one mapped row.
    pub fn from_target(set: &TargetRecordSet, record: &TargetRecord) -> Self {
        let text = |field| {
            set.field(record, field)
                .and_then(TargetValue::as_text)
                .unwrap_or_default()
                .to_string()
        };
        let image_url = text(CanonicalField::ImageUrl);
        let images = if image_url.is_empty() {
            Vec::new()
        } else {
            vec![ImagePayload {
                src: image_url,
                alt_text: text(CanonicalField::ImageAltText),
            }]
        };

        Self {
            handle: text(CanonicalField::Handle),
            title: text(CanonicalField::Title),
            description: text(CanonicalField::Description),
            vendor: text(CanonicalField::Vendor),
            product_type: text(CanonicalField::ProductType),
            tags: text(CanonicalField::Tags),
            published: set
                .field(record, CanonicalField::Published)
                .and_then(TargetValue::as_bool)
                .unwrap_or(true),
            variants: vec![VariantPayload {
                sku: text(CanonicalField::Sku),
                price: set
                    .field(record, CanonicalField::Price)
                    .and_then(TargetValue::as_decimal)
                    .unwrap_or(0.0),
                inventory_quantity: set
                    .field(record, CanonicalField::InventoryQty)
                    .and_then(TargetValue::as_integer)
                    .unwrap_or(0),
                barcode: text(CanonicalField::Barcode),
            }],
            images,
        }
    }

    /// Builds one document per mapped row, in order.
    pub fn from_set(set: &TargetRecordSet) -> Vec<Self> {
        set.records
            .iter()
            .map(|record| Self::from_target(set, record))
            .collect()
    }
}
