//! # Input/Output for average TAD analysis.
//!
//! Everything that touches disk lives here: interval BED files, the
//! per-interval metadata table and its row filters, snip collections,
//! average matrix tables, contact map stores and TOML run configuration.
//!
pub mod avtad;
pub mod config;
pub mod error;
pub mod metadata;
pub mod query;
pub mod snips;
pub mod store;
pub mod table;

// re-expose core functions
pub use avtad::*;
pub use config::*;
pub use error::*;
pub use metadata::*;
pub use query::*;
pub use snips::*;
pub use store::*;
pub use table::*;
