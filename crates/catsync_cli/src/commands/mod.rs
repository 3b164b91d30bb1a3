//! CLI command implementations.

pub mod convert;
pub mod pipelines;
pub mod run;
