pub mod interval;
pub mod interval_set;
pub mod matrix;
pub mod snip;
pub mod variant;

// re-export for cleaner imports
pub use self::interval::{BinSpan, GenomicInterval};
pub use self::interval_set::IntervalSet;
pub use self::matrix::{ChromMatrices, ContactMatrix, MatrixSource};
pub use self::snip::Snip;
pub use self::variant::Variant;
