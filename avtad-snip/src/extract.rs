//! Snip extraction: cut a flanked, log2-transformed square around each interval.

use log::debug;
use ndarray::s;
use rayon::prelude::*;

use avtad_core::models::{BinSpan, ContactMatrix, MatrixSource, Snip};
use avtad_core::utils::log2_or_nan;

use crate::errors::{Result, SnipError};

pub fn validate_window(window: f64) -> Result<()> {
    if window.is_finite() && window >= 0.0 {
        Ok(())
    } else {
        Err(SnipError::InvalidWindow(window))
    }
}

///
/// Cut the snip of one interval.
///
/// The interval is widened by `floor(window * size)` bins on each side and
/// clamped to the matrix, so snips near chromosome ends are smaller than
/// `(1 + 2 * window) * size`. Values are log2-transformed; zero ratios give
/// NaN, never infinity.
///
/// # Arguments
/// - matrix: observed/expected matrix of the interval's chromosome
/// - span: the interval's bins
/// - window: flank size in interval sizes (0 yields the interval's own bins)
pub fn extract_snip(matrix: &ContactMatrix, span: BinSpan, window: f64) -> Snip {
    let n = matrix.rows();
    let flank = (window * span.size() as f64).floor() as i64;

    let outer = span.flanked(flank, n);
    let inner = span.clamp(n);

    let data = matrix
        .view()
        .slice(s![outer.clone(), outer.clone()])
        .mapv(log2_or_nan);

    let core = (inner.start - outer.start)..(inner.end - outer.start);
    Snip::new(data, core)
}

///
/// Cut the snips of a whole interval layout, one per row, in row order.
///
/// `chroms[i]` names the chromosome of `spans[i]`. Rows are processed in
/// parallel against the shared, read-only matrix source.
pub fn extract_snips<S>(chroms: &[&str], spans: &[BinSpan], source: &S, window: f64) -> Result<Vec<Snip>>
where
    S: MatrixSource + ?Sized,
{
    validate_window(window)?;
    if chroms.len() != spans.len() {
        return Err(SnipError::Misaligned {
            chroms: chroms.len(),
            spans: spans.len(),
        });
    }

    debug!("Extracting {} snips with window {}", spans.len(), window);
    chroms
        .par_iter()
        .zip(spans.par_iter())
        .map(|(chrom, span)| {
            let matrix = source.get(chrom)?;
            Ok(extract_snip(matrix, *span, window))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use avtad_core::models::ChromMatrices;
    use ndarray::Array2;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// 100x100 matrix whose cell (i, j) holds 2^(i + j) scaled down, so
    /// log2 recovers the coordinates.
    #[fixture]
    fn matrix() -> ContactMatrix {
        let data = Array2::from_shape_fn((100, 100), |(i, j)| 2f64.powi((i + j) as i32 - 100));
        ContactMatrix::new("chr1", data).unwrap()
    }

    #[rstest]
    fn test_window_zero_is_interval_only(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(10, 20), 0.0);
        assert_eq!(snip.shape(), (10, 10));
        assert_eq!(snip.core, 0..10);
        assert_eq!(snip.data[(0, 0)], -80.0);
    }

    #[rstest]
    fn test_window_one_triples_interior_snips(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(40, 50), 1.0);
        assert_eq!(snip.shape(), (30, 30));
        assert_eq!(snip.core, 10..20);
        // leading edge of the snip is bin 30
        assert_eq!(snip.data[(0, 0)], -40.0);
    }

    #[rstest]
    fn test_clamped_at_chromosome_start(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(0, 10), 1.0);
        assert_eq!(snip.shape(), (20, 20));
        assert_eq!(snip.core, 0..10);
        // leading edge is bin 0, not a negative index
        assert_eq!(snip.data[(0, 0)], -100.0);
    }

    #[rstest]
    fn test_clamped_at_chromosome_end(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(90, 98), 1.0);
        assert_eq!(snip.shape(), (18, 18));
        assert_eq!(snip.core, 8..16);
    }

    #[rstest]
    fn test_fractional_window_floors_flank(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(40, 47), 0.5);
        // floor(3.5) = 3 bins on each side
        assert_eq!(snip.shape(), (13, 13));
        assert_eq!(snip.core, 3..10);
    }

    #[rstest]
    #[case(1e30)]
    #[case(f64::MAX)]
    fn test_huge_window_covers_whole_chromosome(matrix: ContactMatrix, #[case] window: f64) {
        let snip = extract_snip(&matrix, BinSpan::new(40, 45), window);
        assert_eq!(snip.shape(), (100, 100));
        assert_eq!(snip.core, 40..45);
    }

    #[rstest]
    fn test_zero_becomes_nan() {
        let mut data = Array2::ones((5, 5));
        data[(1, 2)] = 0.0;
        let matrix = ContactMatrix::new("chr1", data).unwrap();

        let snip = extract_snip(&matrix, BinSpan::new(0, 5), 0.0);
        assert!(snip.data[(1, 2)].is_nan());
        assert!(snip.data.iter().all(|v| !v.is_infinite()));
        assert_eq!(snip.data[(0, 0)], 0.0);
    }

    #[rstest]
    fn test_span_before_chromosome_start(matrix: ContactMatrix) {
        let snip = extract_snip(&matrix, BinSpan::new(-4, 3), 1.0);
        assert_eq!(snip.shape(), (10, 10));
        assert_eq!(snip.core, 0..3);
    }

    #[rstest]
    fn test_extract_snips_preserves_row_order(matrix: ContactMatrix) {
        let mut source = ChromMatrices::new(1_000);
        source.insert("chr1", matrix);

        let spans = vec![BinSpan::new(50, 60), BinSpan::new(0, 5), BinSpan::new(20, 40)];
        let snips = extract_snips(&["chr1", "chr1", "chr1"], &spans, &source, 0.0).unwrap();

        let shapes: Vec<(usize, usize)> = snips.iter().map(|s| s.shape()).collect();
        assert_eq!(shapes, vec![(10, 10), (5, 5), (20, 20)]);
    }

    #[rstest]
    fn test_extract_snips_missing_chromosome(matrix: ContactMatrix) {
        let mut source = ChromMatrices::new(1_000);
        source.insert("chr1", matrix);

        let result = extract_snips(&["chr2"], &[BinSpan::new(0, 5)], &source, 1.0);
        assert!(matches!(result, Err(SnipError::Core(_))));
    }

    #[rstest]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn test_invalid_window(#[case] window: f64) {
        let source = ChromMatrices::new(1_000);
        let result = extract_snips(&[], &[], &source, window);
        assert!(matches!(result, Err(SnipError::InvalidWindow(_))));
    }
}
