//! # catsync testkit
//!
//! Test utilities for catsync.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - Canned ERP and storefront rows
//! - Temporary source files for file-based pipelines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catsync_testkit::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn handles_are_stable(title in title_strategy()) {
//!         let once = derive_handle(&title);
//!         prop_assert_eq!(derive_handle(&once), once);
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
