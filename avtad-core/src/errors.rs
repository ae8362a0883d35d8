use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvtadCoreError {
    #[error("Contact matrix for {chrom} is not square: {rows}x{cols}")]
    NonSquareMatrix {
        chrom: String,
        rows: usize,
        cols: usize,
    },

    #[error("Chromosome {0} is not present in the contact matrix collection")]
    MissingChromosome(String),

    #[error("Resolution must be a positive number of base pairs, got {0}")]
    InvalidResolution(u64),

    #[error("Invalid interval {chrom}:{start}-{end}: end must be greater than start")]
    InvalidInterval { chrom: String, start: u64, end: u64 },

    #[error("Interval {chrom}:{start}-{end} covers no bins at resolution {resolution}")]
    EmptyBinSpan {
        chrom: String,
        start: u64,
        end: u64,
        resolution: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AvtadCoreError>;
