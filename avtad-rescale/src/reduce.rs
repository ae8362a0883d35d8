//! Cell-wise reduction of rescaled snips into one average matrix.

use std::fmt::Display;
use std::str::FromStr;

use log::debug;
use ndarray::Array2;
use rayon::prelude::*;

use avtad_core::models::Snip;
use avtad_core::utils::{finite_count, nanmean, nanmedian, nansum};

use crate::errors::{RescaleError, Result};
use crate::zoom::{RescaleParams, rescale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Median,
    Sum,
    Count,
}

impl Reducer {
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Sum => "sum",
            Reducer::Count => "count",
        }
    }

    /// Reduce one cell's values across the stack.
    fn apply(&self, values: &[f64]) -> f64 {
        let finite = finite_count(values.iter());
        match self {
            Reducer::Count => finite as f64,
            _ if finite == 0 => f64::NAN,
            Reducer::Mean => nanmean(values.iter()),
            Reducer::Median => nanmedian(values.iter()),
            Reducer::Sum => nansum(values.iter()),
        }
    }
}

impl FromStr for Reducer {
    type Err = RescaleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "sum" => Ok(Reducer::Sum),
            "count" => Ok(Reducer::Count),
            _ => Err(RescaleError::UnknownOperation(s.to_string())),
        }
    }
}

impl Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// Reduce equally-shaped matrices cell by cell, ignoring non-finite values.
///
/// A cell with no finite value is NaN for mean, median and sum, and 0 for
/// count. An empty stack gives an all-NaN matrix (all zeros for count).
pub fn reduce(stack: &[Array2<f64>], shape: (usize, usize), reducer: Reducer) -> Result<Array2<f64>> {
    if let Some(bad) = stack.iter().find(|m| m.dim() != shape) {
        return Err(RescaleError::ShapeMismatch {
            left: shape,
            right: bad.dim(),
        });
    }

    let mut values = Vec::with_capacity(stack.len());
    Ok(Array2::from_shape_fn(shape, |idx| {
        values.clear();
        values.extend(stack.iter().map(|m| m[idx]));
        reducer.apply(&values)
    }))
}

///
/// Rescale the selected snips onto a common grid and reduce them.
///
/// # Arguments
/// - snips: every snip of a run, indexed by table row
/// - indices: the rows to average, typically the rows left after a query
/// - params: target shape, sum preservation and interpolation order
/// - reducer: cell-wise reduction across the rescaled stack
pub fn average(snips: &[Snip], indices: &[usize], params: &RescaleParams, reducer: Reducer) -> Result<Array2<f64>> {
    params.validate()?;
    if let Some(&index) = indices.iter().find(|&&i| i >= snips.len()) {
        return Err(RescaleError::IndexOutOfRange {
            index,
            len: snips.len(),
        });
    }

    debug!(
        "Rescaling {} snips to {:?} and reducing by {}",
        indices.len(),
        params.shape,
        reducer
    );
    let stack = indices
        .par_iter()
        .map(|&i| rescale(snips[i].data.view(), params))
        .collect::<Result<Vec<_>>>()?;

    reduce(&stack, params.shape, reducer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn stack() -> Vec<Array2<f64>> {
        vec![
            array![[1.0, f64::NAN], [2.0, 0.0]],
            array![[f64::NAN, f64::NAN], [4.0, 0.0]],
            array![[3.0, f64::NAN], [6.0, 3.0]],
        ]
    }

    #[rstest]
    #[case("mean", Reducer::Mean)]
    #[case("Median", Reducer::Median)]
    #[case("SUM", Reducer::Sum)]
    #[case("count", Reducer::Count)]
    fn test_parse_reducer(#[case] name: &str, #[case] expected: Reducer) {
        assert_eq!(name.parse::<Reducer>().unwrap(), expected);
    }

    #[rstest]
    fn test_unknown_reducer() {
        assert!(matches!(
            "max".parse::<Reducer>(),
            Err(RescaleError::UnknownOperation(op)) if op == "max"
        ));
    }

    #[rstest]
    fn test_mean_skips_nan(stack: Vec<Array2<f64>>) {
        let out = reduce(&stack, (2, 2), Reducer::Mean).unwrap();
        assert_eq!(out[(0, 0)], 2.0);
        assert!(out[(0, 1)].is_nan());
        assert_eq!(out[(1, 0)], 4.0);
        assert_eq!(out[(1, 1)], 1.0);
    }

    #[rstest]
    fn test_median_sum_count(stack: Vec<Array2<f64>>) {
        let median = reduce(&stack, (2, 2), Reducer::Median).unwrap();
        assert_eq!(median[(1, 1)], 0.0);

        let sum = reduce(&stack, (2, 2), Reducer::Sum).unwrap();
        assert_eq!(sum[(1, 0)], 12.0);
        assert!(sum[(0, 1)].is_nan());

        let count = reduce(&stack, (2, 2), Reducer::Count).unwrap();
        assert_eq!(count, array![[2.0, 0.0], [3.0, 3.0]]);
    }

    #[rstest]
    fn test_empty_stack() {
        let mean = reduce(&[], (3, 3), Reducer::Mean).unwrap();
        assert!(mean.iter().all(|v| v.is_nan()));

        let count = reduce(&[], (3, 3), Reducer::Count).unwrap();
        assert!(count.iter().all(|&v| v == 0.0));
    }

    #[rstest]
    fn test_shape_mismatch() {
        let stack = vec![Array2::zeros((2, 2)), Array2::zeros((3, 3))];
        assert!(matches!(
            reduce(&stack, (2, 2), Reducer::Mean),
            Err(RescaleError::ShapeMismatch { .. })
        ));
    }

    #[rstest]
    fn test_average_selects_rows() {
        let snips = vec![
            Snip::new(Array2::from_elem((4, 4), 1.0), 1..3),
            Snip::new(Array2::from_elem((8, 8), 5.0), 2..6),
            Snip::new(Array2::from_elem((2, 2), 3.0), 0..2),
        ];
        let params = RescaleParams::square(2, false, 1);

        let out = average(&snips, &[0, 2], &params, Reducer::Mean).unwrap();
        assert_eq!(out, Array2::from_elem((2, 2), 2.0));
    }

    #[rstest]
    fn test_average_out_of_range() {
        let snips = vec![Snip::new(Array2::ones((2, 2)), 0..2)];
        let params = RescaleParams::square(2, false, 1);
        assert!(matches!(
            average(&snips, &[0, 4], &params, Reducer::Mean),
            Err(RescaleError::IndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[rstest]
    fn test_average_of_nothing_is_nan() {
        let params = RescaleParams::square(3, true, 1);
        let out = average(&[], &[], &params, Reducer::Median).unwrap();
        assert_eq!(out.dim(), (3, 3));
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
