//! # Core data model for average TAD analysis
//!
//! Genomic intervals and their bin coordinates, per-chromosome contact matrices,
//! and the snips cut from them. Everything else in the workspace builds on
//! these types.
//!
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{AvtadCoreError, Result};
