use std::fmt::{self, Display};

use fxhash::FxHashSet as HashSet;

use crate::errors::{AvtadCoreError, Result};
use crate::models::{BinSpan, GenomicInterval};

///
/// IntervalSet struct, the normalized collection of intervals a run operates on.
///
/// Rows are grouped by chromosome and sorted by `start_bin`; intervals with the
/// same chromosome and bin coordinates are collapsed to the first occurrence.
/// Row positions are the index used to align snip collections and metadata tables.
///
#[derive(Clone, Debug)]
pub struct IntervalSet {
    pub intervals: Vec<GenomicInterval>,
    /// Names of the extra columns carried by every interval.
    pub extra_columns: Vec<String>,
    pub resolution: u64,
}

impl IntervalSet {
    ///
    /// Create a normalized [IntervalSet] from base-pair records.
    ///
    /// # Arguments:
    /// - records: `(chrom, start, end, rest)` tuples in input order
    /// - extra_columns: names for the `rest` fields
    /// - resolution: bin size in base pairs
    pub fn from_bp<I>(records: I, extra_columns: Vec<String>, resolution: u64) -> Result<Self>
    where
        I: IntoIterator<Item = (String, u64, u64, Vec<String>)>,
    {
        if resolution == 0 {
            return Err(AvtadCoreError::InvalidResolution(resolution));
        }

        let mut intervals = Vec::new();
        for (chrom, start, end, rest) in records {
            if end <= start {
                return Err(AvtadCoreError::InvalidInterval { chrom, start, end });
            }
            let interval = GenomicInterval::from_bp(&chrom, start, end, rest, resolution);
            if interval.size() <= 0 {
                return Err(AvtadCoreError::EmptyBinSpan {
                    chrom,
                    start,
                    end,
                    resolution,
                });
            }
            intervals.push(interval);
        }

        Ok(IntervalSet::new(intervals, extra_columns, resolution))
    }

    ///
    /// Normalize already binned intervals: drop duplicates, then sort.
    pub fn new(intervals: Vec<GenomicInterval>, extra_columns: Vec<String>, resolution: u64) -> Self {
        let mut seen: HashSet<(String, i64, i64)> = HashSet::default();
        let mut intervals: Vec<GenomicInterval> = intervals
            .into_iter()
            .filter(|iv| seen.insert((iv.chrom.clone(), iv.start_bin, iv.end_bin)))
            .collect();

        // stable, so equal starts keep their input order
        intervals.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then_with(|| a.start_bin.cmp(&b.start_bin))
        });

        IntervalSet {
            intervals,
            extra_columns,
            resolution,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenomicInterval> {
        self.intervals.iter()
    }

    ///
    /// Iterate unique chromosomes in row order.
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &str> {
        let mut last: Option<&str> = None;
        self.intervals.iter().filter_map(move |iv| {
            if last == Some(iv.chrom.as_str()) {
                None
            } else {
                last = Some(iv.chrom.as_str());
                last
            }
        })
    }

    ///
    /// Row indices of the intervals on one chromosome, ascending.
    ///
    pub fn chrom_indices(&self, chrom: &str) -> Vec<usize> {
        self.intervals
            .iter()
            .enumerate()
            .filter(|(_, iv)| iv.chrom == chrom)
            .map(|(i, _)| i)
            .collect()
    }

    /// Bin spans of the real intervals, in row order.
    pub fn spans(&self) -> Vec<BinSpan> {
        self.intervals.iter().map(|iv| iv.span()).collect()
    }

    /// Chromosome of every row.
    pub fn chroms(&self) -> Vec<&str> {
        self.intervals.iter().map(|iv| iv.chrom.as_str()).collect()
    }
}

impl Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntervalSet with {} intervals at {} bp resolution.",
            self.len(),
            self.resolution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn records() -> Vec<(String, u64, u64, Vec<String>)> {
        vec![
            ("chr2L".to_string(), 40_000, 60_000, vec!["b".to_string()]),
            ("chrX".to_string(), 0, 10_000, vec!["c".to_string()]),
            ("chr2L".to_string(), 0, 20_000, vec!["a".to_string()]),
            ("chr2L".to_string(), 40_500, 61_000, vec!["dup".to_string()]),
        ]
    }

    #[rstest]
    fn test_sorted_and_deduplicated(records: Vec<(String, u64, u64, Vec<String>)>) {
        let set = IntervalSet::from_bp(records, vec!["3".to_string()], 1_000).unwrap();

        assert_eq!(set.len(), 4);
        let starts: Vec<i64> = set.iter().map(|iv| iv.start_bin).collect();
        assert_eq!(starts, vec![0, 40, 40, 0]);

        let set = IntervalSet::from_bp(
            vec![
                ("chr2L".to_string(), 40_000, 60_000, vec![]),
                ("chr2L".to_string(), 40_100, 60_900, vec![]),
            ],
            vec![],
            1_000,
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.intervals[0].start, 40_000);
    }

    #[rstest]
    fn test_iter_chroms_in_row_order(records: Vec<(String, u64, u64, Vec<String>)>) {
        let set = IntervalSet::from_bp(records, vec!["3".to_string()], 1_000).unwrap();
        assert_eq!(set.iter_chroms().collect::<Vec<_>>(), vec!["chr2L", "chrX"]);
        assert_eq!(set.chrom_indices("chrX"), vec![3]);
        assert_eq!(set.chrom_indices("chr3R"), Vec::<usize>::new());
    }

    #[rstest]
    fn test_rejects_zero_resolution(records: Vec<(String, u64, u64, Vec<String>)>) {
        assert!(IntervalSet::from_bp(records, vec![], 0).is_err());
    }

    #[rstest]
    fn test_rejects_interval_without_bins() {
        let result = IntervalSet::from_bp(
            vec![("chr2L".to_string(), 1_100, 1_900, vec![])],
            vec![],
            1_000,
        );
        assert!(matches!(result, Err(AvtadCoreError::EmptyBinSpan { .. })));
    }
}
