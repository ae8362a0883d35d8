//! Per-chromosome contact matrices and the read-only source the snipper queries.

use fxhash::FxHashMap as HashMap;
use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::errors::{AvtadCoreError, Result};

///
/// Dense, square contact matrix of one chromosome.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMatrix {
    data: Array2<f64>,
}

impl ContactMatrix {
    pub fn new(chrom: &str, data: Array2<f64>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != cols {
            return Err(AvtadCoreError::NonSquareMatrix {
                chrom: chrom.to_string(),
                rows,
                cols,
            });
        }
        Ok(ContactMatrix { data })
    }

    /// Number of bins (rows == cols).
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    ///
    /// Divide every diagonal by the mean of its finite values.
    ///
    /// Diagonals without finite values, or with a zero mean, become NaN.
    pub fn observed_over_expected(&mut self) {
        let n = self.rows();
        for offset in 0..n {
            for upper in [true, false] {
                if offset == 0 && !upper {
                    continue;
                }
                let cell = |i: usize| if upper { (i, i + offset) } else { (i + offset, i) };

                let (sum, count) = (0..n - offset)
                    .map(|i| self.data[cell(i)])
                    .filter(|v| v.is_finite())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                let expected = if count > 0 { sum / count as f64 } else { f64::NAN };

                for i in 0..n - offset {
                    let v = &mut self.data[cell(i)];
                    *v = if expected != 0.0 && expected.is_finite() {
                        *v / expected
                    } else {
                        f64::NAN
                    };
                }
            }
        }
    }

    ///
    /// Set the main diagonal and the `k - 1` diagonals on each side of it to NaN.
    ///
    /// `k = 0` leaves the matrix untouched.
    pub fn mask_diagonals(&mut self, k: usize) {
        let n = self.rows();
        for offset in 0..k.min(n) {
            for i in 0..n - offset {
                self.data[(i, i + offset)] = f64::NAN;
                self.data[(i + offset, i)] = f64::NAN;
            }
        }
    }
}

///
/// Read-only access to per-chromosome contact matrices.
///
/// Implementations must be safe to share between worker threads; nothing
/// in the pipeline mutates a source after construction.
pub trait MatrixSource: Sync {
    fn matrix(&self, chrom: &str) -> Option<&ContactMatrix>;

    fn get(&self, chrom: &str) -> Result<&ContactMatrix> {
        self.matrix(chrom)
            .ok_or_else(|| AvtadCoreError::MissingChromosome(chrom.to_string()))
    }
}

///
/// The contact matrices of one map, keyed by chromosome name.
///
#[derive(Debug, Clone, Default)]
pub struct ChromMatrices {
    pub matrices: HashMap<String, ContactMatrix>,
    /// Chromosome order of the source map.
    pub chroms: Vec<String>,
    /// Bin size in base pairs.
    pub resolution: u64,
}

impl ChromMatrices {
    pub fn new(resolution: u64) -> Self {
        ChromMatrices {
            matrices: HashMap::default(),
            chroms: Vec::new(),
            resolution,
        }
    }

    pub fn insert(&mut self, chrom: &str, matrix: ContactMatrix) {
        if !self.matrices.contains_key(chrom) {
            self.chroms.push(chrom.to_string());
        }
        self.matrices.insert(chrom.to_string(), matrix);
    }

    ///
    /// Keep only the chromosomes named in `used`, preserving source order.
    pub fn retain(&mut self, used: &[&str]) {
        self.chroms.retain(|ch| used.contains(&ch.as_str()));
        debug!("Keeping chromosomes {:?}", self.chroms);
        let chroms = &self.chroms;
        self.matrices.retain(|ch, _| chroms.contains(ch));
    }

    ///
    /// Turn raw contacts into masked observed/expected ratios.
    pub fn prepare(mut self, diagonals_to_remove: usize) -> Self {
        debug!(
            "Computing observed/expected for {} chromosomes, masking {} diagonals",
            self.matrices.len(),
            diagonals_to_remove
        );
        for matrix in self.matrices.values_mut() {
            matrix.observed_over_expected();
            matrix.mask_diagonals(diagonals_to_remove);
        }
        self
    }

    /// `(chromosome, number of bins)` in source order.
    pub fn lengths(&self) -> Vec<(&str, usize)> {
        self.chroms
            .iter()
            .filter_map(|ch| self.matrices.get(ch).map(|m| (ch.as_str(), m.rows())))
            .collect()
    }
}

impl MatrixSource for ChromMatrices {
    fn matrix(&self, chrom: &str) -> Option<&ContactMatrix> {
        self.matrices.get(chrom)
    }
}
