use std::io;
use std::path::PathBuf;

use thiserror::Error;

use avtad_core::AvtadCoreError;

/// Error type for avtad-io operations.
#[derive(Error, Debug)]
pub enum AvtadIoError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to open a (possibly gzipped) input.
    #[error(transparent)]
    Open(#[from] anyhow::Error),

    /// A line of a text input could not be parsed.
    #[error("Could not parse line {line} of {path:?}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A column used for grouping or filtering is not in the table.
    #[error("{column} is not in the table columns. Available choices are: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// The row filter expression is not valid.
    #[error("Invalid query {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },

    /// The contact map format is not readable by this tool.
    #[error("Map format {0} is not supported, choose one of: dense, pixels")]
    UnsupportedFormat(String),

    /// Balancing was requested but the map carries no balanced values.
    #[error("Map {0:?} has no balanced values; rerun with --no-balance")]
    BalanceUnavailable(PathBuf),

    /// A dense map manifest is inconsistent with its arrays.
    #[error("Invalid map manifest {path:?}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Npy(#[from] ndarray_npy::ReadNpyError),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Core(#[from] AvtadCoreError),
}

/// Result type alias for avtad-io operations.
pub type Result<T> = std::result::Result<T, AvtadIoError>;
