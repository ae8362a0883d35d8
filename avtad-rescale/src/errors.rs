use thiserror::Error;

#[derive(Error, Debug)]
pub enum RescaleError {
    #[error("Operation {0} is not implemented, choose one of: mean, median, sum, count")]
    UnknownOperation(String),

    #[error("Interpolation order {0} is not supported, it must be between 0 and 5")]
    InvalidOrder(usize),

    #[error("Target shape must be positive in both dimensions, got {0}x{1}")]
    InvalidShape(usize, usize),

    #[error(
        "Index {index} is out of range for a collection of {len} snips; the table and the snips were probably produced by different runs"
    )]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Matrix shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error(
        "Unrecognized token '{token}' at position {position} in expression {expression:?}: only a, b, +, -, *, /, ( and ) are allowed"
    )]
    UnrecognizedToken {
        expression: String,
        token: String,
        position: usize,
    },

    #[error("Malformed expression {expression:?}: {reason}")]
    MalformedExpression { expression: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RescaleError>;
