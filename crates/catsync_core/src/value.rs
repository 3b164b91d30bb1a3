//! Dynamic cell value for unnormalized tabular input.

use std::fmt;

/// A single cell of a raw record.
///
/// Upstream sources disagree on types: spreadsheet exports deliver
/// everything as text, REST APIs deliver JSON scalars. `CellValue` keeps
/// whatever the source produced and defers interpretation to the
/// normalizer, which coerces per canonical field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing or explicitly null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Number(f64),
    /// Text value, untrimmed.
    Text(String),
}

impl CellValue {
    /// Creates a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Returns true for [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns true for null cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the text content if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders any scalar as text. Returns `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }

    /// Interprets the cell as a finite decimal.
    ///
    /// Text is trimmed before parsing. NaN and infinities are rejected.
    pub fn to_decimal(&self) -> Option<f64> {
        let value = match self {
            CellValue::Integer(i) => *i as f64,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null | CellValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Interprets the cell as an integer.
    ///
    /// Integral floats (`3.0`, `"3.0"`) are accepted; fractional ones are not.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Number(n) => integral(*n),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            CellValue::Null | CellValue::Bool(_) => None,
        }
    }

    /// Interprets the cell as a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Integer(0) => Some(false),
            CellValue::Integer(1) => Some(true),
            CellValue::Number(n) if *n == 0.0 => Some(false),
            CellValue::Number(n) if *n == 1.0 => Some(true),
            CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts a JSON value into a cell.
    ///
    /// An array of scalars becomes comma-joined text, the way tag lists are
    /// written in spreadsheets; nulls inside it are skipped. Nested arrays
    /// and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Null => None,
                        Value::String(s) => Some(s.trim().to_string()),
                        scalar => Some(scalar.to_string()),
                    })
                    .collect();
                if parts.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::Text(parts.join(","))
                }
            }
            other => CellValue::Text(other.to_string()),
        }
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::text("x").is_blank());
        assert!(!CellValue::Integer(0).is_blank());
    }

    #[test]
    fn decimal_coercion() {
        assert_eq!(CellValue::text(" 9.99 ").to_decimal(), Some(9.99));
        assert_eq!(CellValue::Integer(4).to_decimal(), Some(4.0));
        assert_eq!(CellValue::text("abc").to_decimal(), None);
        assert_eq!(CellValue::text("NaN").to_decimal(), None);
        assert_eq!(CellValue::text("inf").to_decimal(), None);
        assert_eq!(CellValue::Bool(true).to_decimal(), None);
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(CellValue::text("12").to_integer(), Some(12));
        assert_eq!(CellValue::text("3.0").to_integer(), Some(3));
        assert_eq!(CellValue::text("3.5").to_integer(), None);
        assert_eq!(CellValue::Number(7.0).to_integer(), Some(7));
        assert_eq!(CellValue::Null.to_integer(), None);
    }

    #[test]
    fn bool_coercion() {
        assert_eq!(CellValue::text("TRUE").to_bool(), Some(true));
        assert_eq!(CellValue::text("no").to_bool(), Some(false));
        assert_eq!(CellValue::Integer(1).to_bool(), Some(true));
        assert_eq!(CellValue::text("maybe").to_bool(), None);
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!({"a": 1, "b": 1.5, "c": "x", "d": null, "e": [{"k": 1}]});
        assert_eq!(CellValue::from_json(&json["a"]), CellValue::Integer(1));
        assert_eq!(CellValue::from_json(&json["b"]), CellValue::Number(1.5));
        assert_eq!(CellValue::from_json(&json["c"]), CellValue::text("x"));
        assert_eq!(CellValue::from_json(&json["d"]), CellValue::Null);
        assert_eq!(CellValue::from_json(&json["e"]), CellValue::text(r#"[{"k":1}]"#));
    }

    #[test]
    fn json_tag_lists_are_comma_joined() {
        let json = serde_json::json!({
            "tags": ["summer", " sale ", null, 2024],
            "none": [],
            "nested": [["a"]],
        });
        assert_eq!(CellValue::from_json(&json["tags"]), CellValue::text("summer,sale,2024"));
        assert_eq!(CellValue::from_json(&json["none"]), CellValue::Null);
        assert_eq!(CellValue::from_json(&json["nested"]), CellValue::text(r#"[["a"]]"#));
    }

    #[test]
    fn numbers_render_as_text() {
        assert_eq!(CellValue::Integer(12345).to_text().as_deref(), Some("12345"));
        assert_eq!(CellValue::Null.to_text(), None);
    }
}
