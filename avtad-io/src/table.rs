//! Interval BED input and the generic delimited tables read by `rescale`.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use avtad_core::models::IntervalSet;
use avtad_core::utils::{get_dynamic_reader, get_dynamic_reader_w_stdin};

use crate::error::{AvtadIoError, Result};
use crate::query::Query;

/// Names given to the leading columns of header-less tables.
pub const INTERVAL_COLUMNS: [&str; 3] = ["chromosome", "start", "end"];

fn is_comment(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

/// Tab-separated when the line has tabs, whitespace-separated otherwise.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    }
}

///
/// Read a BED-like interval file and bin it at `resolution`.
///
/// Columns after the third are carried through and named by position
/// (`"3"`, `"4"`, ...). Every data line must have the same number of columns.
///
/// # Arguments
/// - path: plain or gzipped file
/// - resolution: bin size in base pairs of the contact map
pub fn read_intervals(path: &Path, resolution: u64) -> Result<IntervalSet> {
    let reader = get_dynamic_reader(path)?;

    let mut records = Vec::new();
    let mut width: Option<usize> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if is_comment(&line) {
            continue;
        }
        let parse_error = |reason: String| AvtadIoError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(parse_error(format!("expected at least 3 columns, found {}", fields.len())));
        }
        match width {
            None => width = Some(fields.len()),
            Some(w) if w != fields.len() => {
                return Err(parse_error(format!("expected {} columns, found {}", w, fields.len())));
            }
            _ => {}
        }

        let start = fields[1]
            .parse::<u64>()
            .map_err(|e| parse_error(format!("start {:?}: {}", fields[1], e)))?;
        let end = fields[2]
            .parse::<u64>()
            .map_err(|e| parse_error(format!("end {:?}: {}", fields[2], e)))?;
        let rest = fields[3..].iter().map(|s| s.to_string()).collect();

        records.push((fields[0].to_string(), start, end, rest));
    }

    let extra_columns = (3..width.unwrap_or(3)).map(|i| i.to_string()).collect();
    Ok(IntervalSet::from_bp(records, extra_columns, resolution)?)
}

///
/// A delimited table of string cells with an integer row index.
///
/// The index is what aligns a row with its snip: `index[r]` is the position
/// of row `r` in the snip collection.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub index: Vec<usize>,
    pub rows: Vec<Vec<String>>,
}

///
/// How a table file is laid out.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// First column holds the row index.
    pub indexed: bool,
    /// First line names the columns.
    pub has_header: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            indexed: true,
            has_header: true,
        }
    }
}

impl Table {
    ///
    /// Read a table from a file, or from stdin when `source` is `-`.
    ///
    /// Without a header only the first three data columns are kept and named
    /// `chrom`, `start`, `end`. Without an index column rows are numbered
    /// from 0.
    pub fn read(source: &str, layout: TableLayout) -> Result<Table> {
        let reader = get_dynamic_reader_w_stdin(source)?;
        let path = PathBuf::from(source);

        let mut columns: Option<Vec<String>> = None;
        let mut index = Vec::new();
        let mut rows = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = split_fields(&line);

            if columns.is_none() && layout.has_header {
                if layout.indexed && !fields.is_empty() {
                    fields.remove(0);
                }
                columns = Some(fields.iter().map(|s| s.to_string()).collect());
                continue;
            }

            let row_index = if layout.indexed {
                if fields.is_empty() {
                    continue;
                }
                let raw = fields.remove(0);
                raw.parse::<usize>().map_err(|e| AvtadIoError::Parse {
                    path: path.clone(),
                    line: i + 1,
                    reason: format!("index {:?}: {}", raw, e),
                })?
            } else {
                rows.len()
            };

            if !layout.has_header {
                if fields.len() < 3 {
                    return Err(AvtadIoError::Parse {
                        path: path.clone(),
                        line: i + 1,
                        reason: format!("expected at least 3 columns, found {}", fields.len()),
                    });
                }
                fields.truncate(3);
            }

            index.push(row_index);
            rows.push(fields.iter().map(|s| s.to_string()).collect());
        }

        let columns = match (layout.has_header, columns) {
            (true, Some(columns)) => columns,
            _ => INTERVAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Table { columns, index, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    ///
    /// Position of a column, or an error listing the available ones.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AvtadIoError::MissingColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// Cell of row `row` in column `col`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    ///
    /// Keep the rows matching `query`; unknown columns are an error even when
    /// the table is empty.
    pub fn filter(&self, query: &Query) -> Result<Table> {
        let predicate = query.bind(self)?;

        let mut filtered = Table {
            columns: self.columns.clone(),
            index: Vec::new(),
            rows: Vec::new(),
        };
        for row in 0..self.len() {
            if predicate.matches(self, row) {
                filtered.index.push(self.index[row]);
                filtered.rows.push(self.rows[row].clone());
            }
        }
        Ok(filtered)
    }

    ///
    /// Snip indices per distinct value of `column`, in sorted key order.
    ///
    /// Keys sort numerically when every key is a number, lexically otherwise.
    pub fn group_by(&self, column: &str) -> Result<Vec<(String, Vec<usize>)>> {
        let col = self.column(column)?;

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for row in 0..self.len() {
            groups.entry(self.cell(row, col)).or_default().push(self.index[row]);
        }

        let mut groups: Vec<(String, Vec<usize>)> =
            groups.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

        let numeric: Option<Vec<f64>> = groups.iter().map(|(k, _)| k.parse::<f64>().ok()).collect();
        if let Some(keys) = numeric {
            let mut keyed: Vec<(f64, (String, Vec<usize>))> = keys.into_iter().zip(groups).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            groups = keyed.into_iter().map(|(_, g)| g).collect();
        }

        Ok(groups)
    }
}
