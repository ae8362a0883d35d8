use std::cmp::{max, min};
use std::fmt::{self, Display};
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of matrix bins on one chromosome.
///
/// Coordinates are signed: shuffled controls built from nested or
/// overlapping intervals may land partially before bin 0. Use
/// [`BinSpan::clamp`] to turn a span into a valid matrix range.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinSpan {
    pub start: i64,
    pub end: i64,
}

impl BinSpan {
    pub fn new(start: i64, end: i64) -> Self {
        BinSpan { start, end }
    }

    pub fn size(&self) -> i64 {
        self.end - self.start
    }

    ///
    /// Restrict the span to `[0, n)` bins.
    ///
    /// Spans that fall entirely outside the matrix collapse to an empty
    /// range rather than wrapping around.
    pub fn clamp(&self, n: usize) -> Range<usize> {
        let n = n as i64;
        let begin = min(max(self.start, 0), n);
        let end = max(min(self.end, n), begin);
        begin as usize..end as usize
    }

    ///
    /// Grow the span by `flank` bins on both sides and clamp it to `[0, n)`.
    /// Flanks too large for `i64` coordinates saturate.
    pub fn flanked(&self, flank: i64, n: usize) -> Range<usize> {
        BinSpan::new(self.start.saturating_sub(flank), self.end.saturating_add(flank)).clamp(n)
    }
}

impl Display for BinSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

///
/// One annotated genomic interval (e.g. a TAD) with its bin coordinates.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub start_bin: i64,
    pub end_bin: i64,

    /// Extra columns of the input row, carried through unchanged.
    pub rest: Vec<String>,
}

impl GenomicInterval {
    ///
    /// Build an interval from base-pair coordinates, binning them with
    /// `floor(position / resolution)`.
    pub fn from_bp(chrom: &str, start: u64, end: u64, rest: Vec<String>, resolution: u64) -> Self {
        GenomicInterval {
            chrom: chrom.to_string(),
            start,
            end,
            start_bin: (start / resolution) as i64,
            end_bin: (end / resolution) as i64,
            rest,
        }
    }

    pub fn size(&self) -> i64 {
        self.end_bin - self.start_bin
    }

    pub fn span(&self) -> BinSpan {
        BinSpan::new(self.start_bin, self.end_bin)
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_binning_floors_coordinates() {
        let interval = GenomicInterval::from_bp("chr2L", 25_999, 60_001, vec![], 2_000);
        assert_eq!(interval.start_bin, 12);
        assert_eq!(interval.end_bin, 30);
        assert_eq!(interval.size(), 18);
    }

    #[rstest]
    #[case(BinSpan::new(0, 10), 5, 100, 0..15)]
    #[case(BinSpan::new(20, 30), 10, 100, 10..40)]
    #[case(BinSpan::new(90, 98), 8, 100, 82..100)]
    #[case(BinSpan::new(-4, 3), 0, 100, 0..3)]
    #[case(BinSpan::new(120, 130), 0, 100, 100..100)]
    #[case(BinSpan::new(5, 10), i64::MAX, 20, 0..20)]
    #[case(BinSpan::new(-3, 10), i64::MAX, 20, 0..20)]
    fn test_flanked_clamps_to_matrix(
        #[case] span: BinSpan,
        #[case] flank: i64,
        #[case] n: usize,
        #[case] expected: Range<usize>,
    ) {
        assert_eq!(span.flanked(flank, n), expected);
    }
}
