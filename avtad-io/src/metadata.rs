use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use avtad_core::models::{IntervalSet, Variant};
use avtad_snip::{ENRICHMENT_COLUMNS, Enrichment, VariantSummary};

use crate::error::Result;
use crate::table::INTERVAL_COLUMNS;

/// Bin columns written ahead of the statistics of every variant.
pub const BIN_COLUMNS: [&str; 2] = ["start_bin", "end_bin"];

pub fn metadata_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}.TADmetadata.tsv", prefix))
}

///
/// Shortest round-trip text of a float, in the common `repr` style:
/// integral values keep a `.0`, and exponents are used below `1e-4` and from
/// `1e16` up. NaN is written as an empty field.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return String::new();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "-1.2345e-7"
    let sci = format!("{:e}", x);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exponent) {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.abs());
    }

    let point = exponent + 1;
    let body = if point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}.0", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    };
    format!("{}{}", sign, body)
}

fn header(set: &IntervalSet, summaries: &[VariantSummary]) -> Vec<String> {
    let mut columns: Vec<String> = std::iter::once("")
        .chain(INTERVAL_COLUMNS)
        .chain(["size"])
        .map(String::from)
        .collect();
    columns.extend(set.extra_columns.iter().cloned());

    for summary in summaries {
        let suffix = summary.variant.suffix();
        columns.extend(
            BIN_COLUMNS
                .iter()
                .chain(ENRICHMENT_COLUMNS.iter())
                .map(|c| format!("{}{}", c, suffix)),
        );
    }
    columns
}

fn stats_fields(e: &Enrichment) -> [String; 4] {
    [
        format_float(e.sum),
        format_float(e.mean),
        format_float(e.median),
        format_float(e.finite_count as f64),
    ]
}

///
/// Write the per-interval metadata table.
///
/// One row per interval, prefixed with its row index. The real intervals'
/// bins and statistics come first, then six `_shufK` columns per control.
///
/// # Arguments
/// - path: the path to the file to dump to
/// - set: the interval set the summaries are aligned with
/// - summaries: observed variant first, then the controls
pub fn write_metadata<P: AsRef<Path>>(path: P, set: &IntervalSet, summaries: &[VariantSummary]) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        warn!("File {} exists, it will be overwritten!", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    debug_assert!(summaries.first().map(|s| s.variant) == Some(Variant::Observed));

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header(set, summaries).join("\t"))?;

    for (row, iv) in set.iter().enumerate() {
        let mut fields = vec![
            row.to_string(),
            iv.chrom.clone(),
            iv.start.to_string(),
            iv.end.to_string(),
            iv.size().to_string(),
        ];
        fields.extend(iv.rest.iter().cloned());

        for summary in summaries {
            let span = summary.spans[row];
            fields.push(span.start.to_string());
            fields.push(span.end.to_string());
            fields.extend(stats_fields(&summary.enrichment[row]));
        }
        writeln!(out, "{}", fields.join("\t"))?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use avtad_core::models::BinSpan;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::table::{Table, TableLayout};

    #[rstest]
    #[case(3.0, "3.0")]
    #[case(-0.0, "-0.0")]
    #[case(0.1, "0.1")]
    #[case(1e-5, "1e-05")]
    #[case(0.0001, "0.0001")]
    #[case(-2.5e-7, "-2.5e-07")]
    #[case(123456.789, "123456.789")]
    #[case(1e16, "1e+16")]
    #[case(1.5e300, "1.5e+300")]
    #[case(9007199254740993.0, "9007199254740992.0")]
    #[case(f64::NAN, "")]
    #[case(f64::NEG_INFINITY, "-inf")]
    fn test_format_float(#[case] x: f64, #[case] expected: &str) {
        assert_eq!(format_float(x), expected);
    }

    fn enrichment(v: f64) -> Enrichment {
        Enrichment {
            sum: v,
            mean: v / 2.0,
            median: f64::NAN,
            finite_count: 2,
        }
    }

    #[rstest]
    fn test_write_metadata_layout() {
        let records = vec![
            ("chr1".to_string(), 0, 10_000, vec!["A".to_string()]),
            ("chr1".to_string(), 20_000, 30_000, vec!["B".to_string()]),
        ];
        let set = IntervalSet::from_bp(records, vec!["3".to_string()], 1_000).unwrap();
        let summaries = vec![
            VariantSummary {
                variant: Variant::Observed,
                spans: set.spans(),
                enrichment: vec![enrichment(1.0), enrichment(3.0)],
            },
            VariantSummary {
                variant: Variant::Shuffled(0),
                spans: vec![BinSpan::new(15, 25), BinSpan::new(0, 10)],
                enrichment: vec![enrichment(-1.0), enrichment(0.5)],
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.TADmetadata.tsv");
        write_metadata(&path, &set, &summaries).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "\tchromosome\tstart\tend\tsize\t3\tstart_bin\tend_bin\tsum\tmean\tmedian\tfinite_count\t\
             start_bin_shuf0\tend_bin_shuf0\tsum_shuf0\tmean_shuf0\tmedian_shuf0\tfinite_count_shuf0"
        );
        assert_eq!(
            lines[1],
            "0\tchr1\t0\t10000\t10\tA\t0\t10\t1.0\t0.5\t\t2.0\t15\t25\t-1.0\t-0.5\t\t2.0"
        );

        let table = Table::read(path.to_str().unwrap(), TableLayout::default()).unwrap();
        assert_eq!(table.index, vec![0, 1]);
        assert_eq!(table.columns.len(), 17);
        assert_eq!(table.cell(1, table.column("start_bin_shuf0").unwrap()), "0");
    }
}
