//! Error types for the core crate.

use crate::schema::{CanonicalField, Platform};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Stage-fatal errors raised by normalization and mapping.
///
/// Individual bad cell values never produce an error; they are replaced by
/// defaults and recorded in the normalization report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The input table is unusable as a whole (unreadable, no header row).
    #[error("normalization failed for {platform} input: {reason}")]
    Normalization {
        /// Schema the input was read against.
        platform: Platform,
        /// Why the table was rejected.
        reason: String,
    },

    /// A target schema cannot be produced from the canonical model.
    #[error("mapping to {platform} failed: {reason}")]
    Mapping {
        /// Target platform.
        platform: Platform,
        /// Structural problem with the target schema.
        reason: String,
    },
}

impl CoreError {
    /// Creates a normalization failure.
    pub fn normalization(platform: Platform, reason: impl Into<String>) -> Self {
        Self::Normalization {
            platform,
            reason: reason.into(),
        }
    }

    /// Creates a mapping failure for a required field the schema never exposes.
    pub fn missing_required(platform: Platform, field: CanonicalField) -> Self {
        Self::Mapping {
            platform,
            reason: format!("schema has no column for required field `{field}`"),
        }
    }

    /// Creates a mapping failure with a free-form reason.
    pub fn mapping(platform: Platform, reason: impl Into<String>) -> Self {
        Self::Mapping {
            platform,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::normalization(Platform::Shopify, "missing header row");
        assert_eq!(
            err.to_string(),
            "normalization failed for shopify input: missing header row"
        );

        let err = CoreError::missing_required(Platform::Zoey, CanonicalField::Sku);
        assert!(err.to_string().contains("zoey"));
        assert!(err.to_string().contains("sku"));
    }
}
