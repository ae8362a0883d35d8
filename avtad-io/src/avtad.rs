//! Average matrix tables: `{prefix}.avTAD[.{column}:{value}].tsv`.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::warn;
use ndarray::{Array2, ArrayView2};

use avtad_core::utils::get_dynamic_reader;

use crate::error::{AvtadIoError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

///
/// Path of an average matrix, optionally for one group of a split.
///
/// # Arguments
/// - prefix: output prefix
/// - group: `(column, value)` of the group, if the table was split
pub fn average_path(prefix: &str, group: Option<(&str, &str)>) -> PathBuf {
    mode_path(prefix, &mode(group))
}

/// Path of the average matrix of `prefix` with a given mode infix.
pub fn mode_path(prefix: &str, mode: &str) -> PathBuf {
    PathBuf::from(format!("{}.avTAD{}.tsv", prefix, mode))
}

/// File name infix of a group: `""` or `".{column}:{value}"`.
pub fn mode(group: Option<(&str, &str)>) -> String {
    match group {
        Some((column, value)) => format!(".{}:{}", column, value),
        None => String::new(),
    }
}

///
/// Modes of every average matrix written under `prefix`, sorted.
pub fn find_modes(prefix: &str) -> Result<Vec<String>> {
    let pattern = format!("{}.avTAD*.tsv", glob::Pattern::escape(prefix));
    let head = format!("{}.avTAD", prefix);

    let paths = glob::glob(&pattern).map_err(|e| AvtadIoError::Parse {
        path: PathBuf::from(&pattern),
        line: 0,
        reason: e.to_string(),
    })?;

    let mut modes: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .filter_map(|path| {
            let path = path.to_string_lossy().to_string();
            path.strip_prefix(&head)
                .and_then(|rest| rest.strip_suffix(".tsv"))
                .map(String::from)
        })
        .filter(|mode| mode.is_empty() || mode.starts_with('.'))
        .collect();
    modes.sort();
    Ok(modes)
}

///
/// Text in the style of C's `%.6e`: six decimals and an exponent of at least
/// two digits (`1.000000e+00`); non-finite values as `nan`, `inf`, `-inf`.
pub fn format_sci(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let sci = format!("{:.6e}", x);
    match sci.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let exp_sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, exp_sign, exponent.abs())
        }
        None => sci,
    }
}

///
/// Write an average matrix with a one-line `# ` header.
///
/// # Arguments
/// - path: the path to the file to dump to
/// - matrix: the matrix to write, row by row
/// - header: run description, see [rescale_header] and [evaluate_header]
pub fn write_average<P: AsRef<Path>>(path: P, matrix: ArrayView2<'_, f64>, header: &str) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        warn!("File {} exists, it will be overwritten!", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# {}", header)?;
    for row in matrix.rows() {
        let fields: Vec<String> = row.iter().map(|&v| format_sci(v)).collect();
        writeln!(out, "{}", fields.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

///
/// Read an average matrix, skipping `#` lines.
pub fn read_average(path: &Path) -> Result<Array2<f64>> {
    let reader = get_dynamic_reader(path)?;

    let mut values = Vec::new();
    let mut cols: Option<usize> = None;
    let mut rows = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_error = |reason: String| AvtadIoError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };

        let row = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("value {:?}: {}", field, e)))
            })
            .collect::<Result<Vec<f64>>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(c) if c != row.len() => {
                return Err(parse_error(format!("expected {} values, found {}", c, row.len())));
            }
            _ => {}
        }
        values.extend(row);
        rows += 1;
    }

    let shape = (rows, cols.unwrap_or(0));
    Array2::from_shape_vec(shape, values).map_err(|e| AvtadIoError::Parse {
        path: path.to_path_buf(),
        line: 0,
        reason: e.to_string(),
    })
}

///
/// Everything a `rescale` header records about one average matrix.
///
#[derive(Debug, Clone)]
pub struct RescaleRun<'a> {
    pub snips: &'a str,
    pub table: &'a str,
    pub query: Option<&'a str>,
    pub operation: &'a str,
    pub timestamp: NaiveDateTime,
}

/// Header of an average matrix produced by `rescale`.
pub fn rescale_header(run: &RescaleRun<'_>, n_snips: usize, group: Option<(&str, &str)>) -> String {
    let mut header = format!(
        "{} snips from {} as indexed in {} (query: {}) averaged by {} at {}",
        n_snips,
        run.snips,
        run.table,
        run.query.unwrap_or("None"),
        run.operation,
        run.timestamp.format(TIMESTAMP_FORMAT)
    );
    if let Some((column, value)) = group {
        header.push_str(&format!(" group {} of {}", value, column));
    }
    header
}

/// Header of a matrix produced by `evaluate`.
pub fn evaluate_header(expression: &str, a_prefix: &str, b_prefix: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{} for a={} and b={} at {}",
        expression,
        a_prefix,
        b_prefix,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 59)
            .unwrap()
    }

    #[rstest]
    #[case(1.0, "1.000000e+00")]
    #[case(0.0, "0.000000e+00")]
    #[case(-0.00123456789, "-1.234568e-03")]
    #[case(6.02e23, "6.020000e+23")]
    #[case(1e-300, "1.000000e-300")]
    #[case(f64::NAN, "nan")]
    #[case(f64::INFINITY, "inf")]
    fn test_format_sci(#[case] x: f64, #[case] expected: &str) {
        assert_eq!(format_sci(x), expected);
    }

    #[rstest]
    fn test_paths() {
        assert_eq!(average_path("out/OSC", None), PathBuf::from("out/OSC.avTAD.tsv"));
        assert_eq!(
            average_path("OSC", Some(("chromosome", "chr2L"))),
            PathBuf::from("OSC.avTAD.chromosome:chr2L.tsv")
        );
    }

    #[rstest]
    fn test_headers(timestamp: NaiveDateTime) {
        let run = RescaleRun {
            snips: "OSC.TADsnips.bin",
            table: "OSC.TADmetadata.tsv",
            query: None,
            operation: "mean",
            timestamp,
        };
        assert_eq!(
            rescale_header(&run, 12, None),
            "12 snips from OSC.TADsnips.bin as indexed in OSC.TADmetadata.tsv (query: None) averaged by mean at 2024-03-09 14:05"
        );
        assert_eq!(
            rescale_header(&RescaleRun { query: Some("size>20"), ..run }, 3, Some(("chromosome", "chrX"))),
            "3 snips from OSC.TADsnips.bin as indexed in OSC.TADmetadata.tsv (query: size>20) averaged by mean at 2024-03-09 14:05 group chrX of chromosome"
        );
        assert_eq!(
            evaluate_header("a-b", "OSC", "OSC_shuf0", timestamp),
            "a-b for a=OSC and b=OSC_shuf0 at 2024-03-09 14:05"
        );
    }

    #[rstest]
    fn test_write_then_read(timestamp: NaiveDateTime) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.avTAD.tsv");
        let matrix = array![[1.0, f64::NAN], [-2.5e-3, 4.0]];

        write_average(&path, matrix.view(), &evaluate_header("a", "x", "y", timestamp)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "# a for a=x and b=y at 2024-03-09 14:05\n\
             1.000000e+00\tnan\n\
             -2.500000e-03\t4.000000e+00\n"
        );

        let back = read_average(&path).unwrap();
        assert_eq!(back.dim(), (2, 2));
        assert!(back[(0, 1)].is_nan());
        assert_eq!(back[(1, 0)], -2.5e-3);
    }

    #[rstest]
    fn test_read_ragged_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.avTAD.tsv");
        std::fs::write(&path, "# h\n1\t2\n3\n").unwrap();
        assert!(matches!(read_average(&path), Err(AvtadIoError::Parse { line: 3, .. })));
    }

    #[rstest]
    fn test_find_modes() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("OSC");
        let prefix = prefix.to_str().unwrap();
        for name in ["OSC.avTAD.tsv", "OSC.avTAD.chromosome:chr2L.tsv", "OSC.avTAD.chromosome:chrX.tsv", "OSC_shuf0.avTAD.tsv"] {
            std::fs::write(dir.path().join(name), "# h\n1\n").unwrap();
        }

        let modes = find_modes(prefix).unwrap();
        assert_eq!(modes, vec!["", ".chromosome:chr2L", ".chromosome:chrX"]);
    }
}
