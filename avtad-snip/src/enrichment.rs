//! Per-interval enrichment statistics.

use ndarray::ArrayView2;
use rayon::prelude::*;

use avtad_core::models::{BinSpan, ContactMatrix, MatrixSource, Snip};
use avtad_core::utils::{finite_count, nanmean, nanmedian, nansum};

use crate::errors::{Result, SnipError};
use crate::extract::extract_snip;

/// Column stems of the statistics, in output order.
pub const ENRICHMENT_COLUMNS: [&str; 4] = ["sum", "mean", "median", "finite_count"];

///
/// NaN-aware summary of one interval's log2 observed/expected block.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enrichment {
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub finite_count: usize,
}

/// Summarize any block of log2 ratios.
pub fn summarize(view: ArrayView2<'_, f64>) -> Enrichment {
    Enrichment {
        sum: nansum(view.iter()),
        mean: nanmean(view.iter()),
        median: nanmedian(view.iter()),
        finite_count: finite_count(view.iter()),
    }
}

/// Summarize the interval's own bins (no flank).
pub fn summarize_span(matrix: &ContactMatrix, span: BinSpan) -> Enrichment {
    let snip = extract_snip(matrix, span, 0.0);
    summarize(snip.data.view())
}

///
/// Summarize every row of an interval layout, in row order.
pub fn summarize_spans<S>(chroms: &[&str], spans: &[BinSpan], source: &S) -> Result<Vec<Enrichment>>
where
    S: MatrixSource + ?Sized,
{
    if chroms.len() != spans.len() {
        return Err(SnipError::Misaligned {
            chroms: chroms.len(),
            spans: spans.len(),
        });
    }

    chroms
        .par_iter()
        .zip(spans.par_iter())
        .map(|(chrom, span)| Ok(summarize_span(source.get(chrom)?, *span)))
        .collect()
}

///
/// Enrichment of the interval block relative to its whole snip.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalEnrichment {
    pub sum_ratio: f64,
    pub mean_ratio: f64,
    pub median_ratio: f64,
    pub core_finite_count: usize,
}

fn ratio(a: f64, b: f64) -> f64 {
    let r = a / b;
    if r.is_infinite() { f64::NAN } else { r }
}

///
/// Compare the interval block of a snip with the whole snip.
///
/// The block bounds come from the snip itself, so they are exact bin
/// indices even when the flank was clamped at a chromosome end.
pub fn local_enrichment(snip: &Snip) -> LocalEnrichment {
    let core = summarize(snip.core_view());
    let whole = summarize(snip.data.view());
    LocalEnrichment {
        sum_ratio: ratio(core.sum, whole.sum),
        mean_ratio: ratio(core.mean, whole.mean),
        median_ratio: ratio(core.median, whole.median),
        core_finite_count: core.finite_count,
    }
}
