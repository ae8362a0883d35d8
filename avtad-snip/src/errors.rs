use thiserror::Error;

use avtad_core::AvtadCoreError;

#[derive(Error, Debug)]
pub enum SnipError {
    #[error("Window must be a finite, non-negative number of interval sizes, got {0}")]
    InvalidWindow(f64),

    #[error("Shuffled interval sizes on {chrom} do not reproduce the source sizes")]
    SizeInvariant { chrom: String },

    #[error("Got {chroms} chromosome labels for {spans} spans; they must align row by row")]
    Misaligned { chroms: usize, spans: usize },

    #[error(transparent)]
    Core(#[from] AvtadCoreError),
}

pub type Result<T> = std::result::Result<T, SnipError>;
