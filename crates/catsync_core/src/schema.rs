//! Platform schema descriptors.
//!
//! Every platform is described by one static, ordered field table. The same
//! table drives both directions: ingest (which source column feeds which
//! canonical field) and export (which columns to emit, in what order, with
//! which defaults).

use crate::error::{CoreError, CoreResult};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Canonical product fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    /// URL-safe slug.
    Handle,
    /// Product title. Mandatory.
    Title,
    /// Plain-text description.
    Description,
    /// Vendor or brand.
    Vendor,
    /// Product type or category.
    ProductType,
    /// Comma-joined tags.
    Tags,
    /// Whether the product is published.
    Published,
    /// Stock keeping unit. Mandatory.
    Sku,
    /// Unit price.
    Price,
    /// Units in stock.
    InventoryQty,
    /// Barcode (UPC/EAN).
    Barcode,
    /// Primary image URL.
    ImageUrl,
    /// Primary image alt text.
    ImageAltText,
    /// Lifecycle status.
    Status,
}

/// Value kind of a canonical field, used for coercion and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text.
    Text,
    /// Text that may carry HTML markup on ingest.
    Html,
    /// Non-negative decimal.
    Decimal,
    /// Non-negative integer.
    Integer,
    /// Boolean.
    Boolean,
    /// `active` / `draft` / `archived`.
    Status,
}

impl CanonicalField {
    /// All canonical fields in declaration order.
    pub const ALL: [CanonicalField; 14] = [
        CanonicalField::Handle,
        CanonicalField::Title,
        CanonicalField::Description,
        CanonicalField::Vendor,
        CanonicalField::ProductType,
        CanonicalField::Tags,
        CanonicalField::Published,
        CanonicalField::Sku,
        CanonicalField::Price,
        CanonicalField::InventoryQty,
        CanonicalField::Barcode,
        CanonicalField::ImageUrl,
        CanonicalField::ImageAltText,
        CanonicalField::Status,
    ];

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Handle => "handle",
            CanonicalField::Title => "title",
            CanonicalField::Description => "description",
            CanonicalField::Vendor => "vendor",
            CanonicalField::ProductType => "product_type",
            CanonicalField::Tags => "tags",
            CanonicalField::Published => "published",
            CanonicalField::Sku => "sku",
            CanonicalField::Price => "price",
            CanonicalField::InventoryQty => "inventory_qty",
            CanonicalField::Barcode => "barcode",
            CanonicalField::ImageUrl => "image_url",
            CanonicalField::ImageAltText => "image_alt_text",
            CanonicalField::Status => "status",
        }
    }

    /// Value kind of this field.
    pub fn kind(self) -> FieldKind {
        match self {
            CanonicalField::Description => FieldKind::Html,
            CanonicalField::Published => FieldKind::Boolean,
            CanonicalField::Price => FieldKind::Decimal,
            CanonicalField::InventoryQty => FieldKind::Integer,
            CanonicalField::Status => FieldKind::Status,
            _ => FieldKind::Text,
        }
    }

    /// Whether a record without this field must be dropped.
    pub fn is_key(self) -> bool {
        matches!(self, CanonicalField::Sku | CanonicalField::Title)
    }

    pub(crate) fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three supported platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// ERP system.
    NetSuite,
    /// Primary storefront.
    Shopify,
    /// Secondary storefront.
    Zoey,
}

impl Platform {
    /// All platforms.
    pub const ALL: [Platform; 3] = [Platform::NetSuite, Platform::Shopify, Platform::Zoey];

    /// Lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::NetSuite => "netsuite",
            Platform::Shopify => "shopify",
            Platform::Zoey => "zoey",
        }
    }

    /// Static schema descriptor for this platform.
    pub fn schema(self) -> &'static PlatformSchema {
        match self {
            Platform::NetSuite => &NETSUITE_SCHEMA,
            Platform::Shopify => &SHOPIFY_SCHEMA,
            Platform::Zoey => &ZOEY_SCHEMA,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "netsuite" | "erp" => Ok(Platform::NetSuite),
            "shopify" => Ok(Platform::Shopify),
            "zoey" => Ok(Platform::Zoey),
            other => Err(format!(
                "unknown platform `{other}` (expected netsuite, shopify or zoey)"
            )),
        }
    }
}

/// Platform-side default applied by the mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// The zero value of the field kind (`""`, `0`, `false`).
    Empty,
    /// Fixed text.
    Text(&'static str),
    /// Fixed decimal.
    Decimal(f64),
    /// Fixed integer.
    Integer(i64),
    /// Fixed boolean.
    Bool(bool),
}

impl DefaultValue {
    /// Returns true if this default carries information beyond the zero value.
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, DefaultValue::Empty | DefaultValue::Text(""))
    }
}

/// Where an exported column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldSource {
    /// A canonical field.
    Canonical(CanonicalField),
    /// A fixed value, export only.
    Constant(&'static str),
}

/// One column of a platform schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    /// Value source.
    pub source: FieldSource,
    /// Column name on the platform side.
    pub name: &'static str,
    /// Alternative source column names accepted on ingest.
    pub aliases: &'static [&'static str],
    /// Platform default used by the mapper.
    pub default: DefaultValue,
    /// Whether ingest warns when the column is absent.
    pub required: bool,
}

impl FieldDescriptor {
    /// Describes a column fed by a canonical field.
    pub const fn field(field: CanonicalField, name: &'static str) -> Self {
        Self {
            source: FieldSource::Canonical(field),
            name,
            aliases: &[],
            default: DefaultValue::Empty,
            required: false,
        }
    }

    /// Describes a fixed-value column.
    pub const fn constant(name: &'static str, value: &'static str) -> Self {
        Self {
            source: FieldSource::Constant(value),
            name,
            aliases: &[],
            default: DefaultValue::Empty,
            required: false,
        }
    }

    /// Sets alternative ingest names.
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Sets the platform default.
    pub const fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    /// Marks the column as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The canonical field feeding this column, if any.
    pub fn canonical(&self) -> Option<CanonicalField> {
        match self.source {
            FieldSource::Canonical(field) => Some(field),
            FieldSource::Constant(_) => None,
        }
    }

    /// Normalized names this column answers to on ingest, primary name first.
    pub fn ingest_names(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .map(normalize_column_name)
    }
}

/// Ordered field table of one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSchema {
    /// Platform described.
    pub platform: Platform,
    /// Columns in export order.
    pub fields: &'static [FieldDescriptor],
}

impl PlatformSchema {
    /// Creates a schema from a static field table.
    pub const fn new(platform: Platform, fields: &'static [FieldDescriptor]) -> Self {
        Self { platform, fields }
    }

    /// Column names in export order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Descriptor of the column fed by `field`.
    pub fn descriptor(&self, field: CanonicalField) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.canonical() == Some(field))
    }

    /// Position of the column fed by `field`.
    pub fn position(&self, field: CanonicalField) -> Option<usize> {
        self.fields.iter().position(|f| f.canonical() == Some(field))
    }

    /// Checks that the schema can carry canonical records.
    ///
    /// Sku and title must be exposed, and column names must be unique.
    pub fn validate(&self) -> CoreResult<()> {
        for key in [CanonicalField::Sku, CanonicalField::Title] {
            if self.descriptor(key).is_none() {
                return Err(CoreError::missing_required(self.platform, key));
            }
        }
        let mut seen = HashSet::new();
        for field in self.fields {
            if !seen.insert(field.name) {
                return Err(CoreError::mapping(
                    self.platform,
                    format!("duplicate column `{}`", field.name),
                ));
            }
        }
        Ok(())
    }
}

/// Normalizes a column header so platform variants converge.
///
/// Lowercases, replaces spaces with underscores and strips parentheses:
/// `"Body (HTML)"` becomes `"body_html"`, `"Variant SKU"` becomes `"variant_sku"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

use CanonicalField as F;

static NETSUITE_FIELDS: [FieldDescriptor; 14] = [
    FieldDescriptor::field(F::Handle, "handle"),
    FieldDescriptor::field(F::Title, "title")
        .aliases(&["displayName", "name"])
        .required(),
    FieldDescriptor::field(F::Description, "description")
        .aliases(&["salesDescription", "Body (HTML)"])
        .required(),
    FieldDescriptor::field(F::Vendor, "vendor")
        .aliases(&["brand", "manufacturer"])
        .default_value(DefaultValue::Text("Unknown")),
    FieldDescriptor::field(F::ProductType, "type")
        .aliases(&["product_type", "itemType"])
        .default_value(DefaultValue::Text("Product")),
    FieldDescriptor::field(F::Tags, "tags"),
    FieldDescriptor::field(F::Published, "published").default_value(DefaultValue::Bool(true)),
    FieldDescriptor::field(F::Sku, "variant sku")
        .aliases(&["sku", "itemId"])
        .required(),
    FieldDescriptor::field(F::Price, "variant price")
        .aliases(&["price", "basePrice"])
        .default_value(DefaultValue::Decimal(0.0))
        .required(),
    FieldDescriptor::field(F::InventoryQty, "inventory_qty")
        .aliases(&["quantityAvailable", "variant inventory qty"])
        .default_value(DefaultValue::Integer(0)),
    FieldDescriptor::field(F::Barcode, "barcode").aliases(&["upcCode", "variant barcode"]),
    FieldDescriptor::field(F::ImageUrl, "image_url").aliases(&["image src"]),
    FieldDescriptor::field(F::ImageAltText, "image_alt_text"),
    FieldDescriptor::field(F::Status, "status").default_value(DefaultValue::Text("active")),
];

static SHOPIFY_FIELDS: [FieldDescriptor; 22] = [
    FieldDescriptor::field(F::Handle, "Handle"),
    FieldDescriptor::field(F::Title, "Title").required(),
    FieldDescriptor::field(F::Description, "Body (HTML)")
        .aliases(&["description"])
        .required(),
    FieldDescriptor::field(F::Vendor, "Vendor").default_value(DefaultValue::Text("Unknown")),
    FieldDescriptor::field(F::ProductType, "Type")
        .aliases(&["product_type"])
        .default_value(DefaultValue::Text("Product")),
    FieldDescriptor::field(F::Tags, "Tags"),
    FieldDescriptor::field(F::Published, "Published").default_value(DefaultValue::Bool(true)),
    FieldDescriptor::constant("Option1 Name", "Title"),
    FieldDescriptor::constant("Option1 Value", "Default Title"),
    FieldDescriptor::field(F::Sku, "Variant SKU")
        .aliases(&["sku"])
        .required(),
    FieldDescriptor::field(F::InventoryQty, "Variant Inventory Qty")
        .aliases(&["inventory_qty"])
        .default_value(DefaultValue::Integer(0)),
    FieldDescriptor::constant("Variant Inventory Policy", "deny"),
    FieldDescriptor::constant("Variant Fulfillment Service", "manual"),
    FieldDescriptor::field(F::Price, "Variant Price")
        .aliases(&["price"])
        .default_value(DefaultValue::Decimal(0.0))
        .required(),
    FieldDescriptor::constant("Variant Requires Shipping", "TRUE"),
    FieldDescriptor::constant("Variant Taxable", "TRUE"),
    FieldDescriptor::field(F::Barcode, "Variant Barcode").aliases(&["barcode"]),
    FieldDescriptor::field(F::ImageUrl, "Image Src").aliases(&["image_url"]),
    FieldDescriptor::field(F::ImageAltText, "Image Alt Text"),
    FieldDescriptor::constant("Gift Card", "FALSE"),
    FieldDescriptor::constant("Variant Weight Unit", "lb"),
    FieldDescriptor::field(F::Status, "Status").default_value(DefaultValue::Text("active")),
];

static ZOEY_FIELDS: [FieldDescriptor; 13] = [
    FieldDescriptor::field(F::Handle, "Handle"),
    FieldDescriptor::field(F::Title, "Title").required(),
    FieldDescriptor::field(F::Description, "Description")
        .aliases(&["Body (HTML)"])
        .required(),
    FieldDescriptor::field(F::Vendor, "Vendor").default_value(DefaultValue::Text("Unknown")),
    FieldDescriptor::field(F::ProductType, "Type").default_value(DefaultValue::Text("Product")),
    FieldDescriptor::field(F::Tags, "Tags"),
    FieldDescriptor::field(F::Published, "Published").default_value(DefaultValue::Bool(true)),
    FieldDescriptor::field(F::Sku, "SKU")
        .aliases(&["variant sku"])
        .required(),
    FieldDescriptor::field(F::Price, "Price")
        .aliases(&["variant price"])
        .default_value(DefaultValue::Decimal(0.0))
        .required(),
    FieldDescriptor::field(F::InventoryQty, "Inventory Quantity")
        .aliases(&["variant inventory qty"])
        .default_value(DefaultValue::Integer(0)),
    FieldDescriptor::field(F::Barcode, "Barcode").aliases(&["variant barcode"]),
    FieldDescriptor::field(F::ImageUrl, "Image URL").aliases(&["image src"]),
    FieldDescriptor::field(F::ImageAltText, "Image Alt Text"),
];

/// ERP item schema.
pub static NETSUITE_SCHEMA: PlatformSchema = PlatformSchema::new(Platform::NetSuite, &NETSUITE_FIELDS);

/// Primary storefront product import schema.
pub static SHOPIFY_SCHEMA: PlatformSchema = PlatformSchema::new(Platform::Shopify, &SHOPIFY_FIELDS);

/// Secondary storefront product schema.
pub static ZOEY_SCHEMA: PlatformSchema = PlatformSchema::new(Platform::Zoey, &ZOEY_FIELDS);
