use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Get a reader for a file path, or stdin when the path is `-`.
pub fn get_dynamic_reader_w_stdin(file_path_str: &str) -> Result<Box<dyn BufRead>> {
    if file_path_str == "-" {
        Ok(Box::new(BufReader::new(std::io::stdin())))
    } else {
        Ok(Box::new(get_dynamic_reader(Path::new(file_path_str))?))
    }
}

/// Sum of the finite values; `0.0` when there are none.
pub fn nansum<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    values.into_iter().filter(|v| v.is_finite()).sum()
}

/// Mean of the finite values; NaN when there are none.
pub fn nanmean<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Median of the finite values; NaN when there are none.
pub fn nanmedian<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    let mut finite: Vec<f64> = values.into_iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n == 0 {
        return f64::NAN;
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    if n % 2 == 0 {
        (finite[n / 2 - 1] + finite[n / 2]) / 2.0
    } else {
        finite[n / 2]
    }
}

/// Number of finite values.
pub fn finite_count<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> usize {
    values.into_iter().filter(|v| v.is_finite()).count()
}

/// `log2(x)`, with infinities (from zero input) reported as NaN.
pub fn log2_or_nan(x: f64) -> f64 {
    let v = x.log2();
    if v.is_infinite() { f64::NAN } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_nan_aware_statistics() {
        let values = [1.0, f64::NAN, 3.0, 4.0, f64::INFINITY];
        assert_eq!(nansum(&values), 8.0);
        assert_eq!(nanmean(&values), 8.0 / 3.0);
        assert_eq!(nanmedian(&values), 3.0);
        assert_eq!(finite_count(&values), 3);
    }

    #[rstest]
    fn test_all_nan() {
        let values = [f64::NAN, f64::NAN];
        assert_eq!(nansum(&values), 0.0);
        assert!(nanmean(&values).is_nan());
        assert!(nanmedian(&values).is_nan());
        assert_eq!(finite_count(&values), 0);
    }

    #[rstest]
    fn test_even_median() {
        assert_eq!(nanmedian(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    fn test_log2_of_non_positive_is_nan(#[case] x: f64) {
        assert!(log2_or_nan(x).is_nan());
    }

    #[rstest]
    fn test_log2_positive() {
        assert_eq!(log2_or_nan(8.0), 3.0);
    }
}
