use std::ops::Range;

use ndarray::{Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};

///
/// A log2 observed/expected submatrix cut around one interval.
///
/// `core` is the row (and column) range of the interval's own bins inside
/// `data`; the rest of the matrix is flank. Near chromosome ends the flank
/// is clamped, so `core` is not necessarily centered.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snip {
    pub data: Array2<f64>,
    pub core: Range<usize>,
}

impl Snip {
    pub fn new(data: Array2<f64>, core: Range<usize>) -> Self {
        Snip { data, core }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The interval-by-interval block.
    pub fn core_view(&self) -> ArrayView2<'_, f64> {
        self.data
            .slice(s![self.core.clone(), self.core.clone()])
    }
}
