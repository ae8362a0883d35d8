//! Contact map stores.
//!
//! Two layouts are readable:
//!
//! - `dense`: a TOML manifest listing one `.npy` matrix per chromosome, with
//!   optional balancing weights
//! - `pixels`: a text dump of `chrom1 start1 end1 chrom2 start2 end2 count
//!   [balanced]` rows, as `cooler dump --join` writes it
//!
//! Both return raw (or balanced) contacts; observed/expected and diagonal
//! masking happen afterwards in [ChromMatrices::prepare].

use std::fmt::Display;
use std::fs::read_to_string;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fxhash::FxHashMap as HashMap;
use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use ndarray_npy::read_npy;
use serde::{Deserialize, Serialize};

use avtad_core::models::{ChromMatrices, ContactMatrix};
use avtad_core::utils::get_dynamic_reader;

use crate::error::{AvtadIoError, Result};
use crate::table::split_fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    Dense,
    Pixels,
}

impl FromStr for MapFormat {
    type Err = AvtadIoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dense" => Ok(MapFormat::Dense),
            "pixels" => Ok(MapFormat::Pixels),
            other => Err(AvtadIoError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Display for MapFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapFormat::Dense => write!(f, "dense"),
            MapFormat::Pixels => write!(f, "pixels"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct DenseChromosome {
    pub name: String,
    /// `.npy` file of the square contact matrix, relative to the manifest.
    pub matrix: PathBuf,
    /// `.npy` file of per-bin balancing weights, relative to the manifest.
    pub weights: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct DenseManifest {
    pub resolution: u64,
    pub chromosomes: Vec<DenseChromosome>,
}

impl TryFrom<&Path> for DenseManifest {
    type Error = AvtadIoError;

    fn try_from(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)?;
        let manifest = toml::from_str(&toml_str)?;
        Ok(manifest)
    }
}

///
/// Load every chromosome of a contact map.
///
/// # Arguments
/// - path: manifest (`dense`) or pixel dump (`pixels`)
/// - format: store layout
/// - balance: apply the store's balancing weights
pub fn load_matrices(path: &Path, format: MapFormat, balance: bool) -> Result<ChromMatrices> {
    info!("Reading {} in {} format with balance={}", path.display(), format, balance);
    match format {
        MapFormat::Dense => load_dense(path, balance),
        MapFormat::Pixels => load_pixels(path, balance),
    }
}

fn load_dense(path: &Path, balance: bool) -> Result<ChromMatrices> {
    let manifest = DenseManifest::try_from(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut matrices = ChromMatrices::new(manifest.resolution);
    for chrom in &manifest.chromosomes {
        let mut data: Array2<f64> = read_npy(base.join(&chrom.matrix))?;

        match (&chrom.weights, balance) {
            (Some(weights), true) => {
                let weights: Array1<f64> = read_npy(base.join(weights))?;
                if weights.len() != data.nrows() {
                    return Err(AvtadIoError::Manifest {
                        path: path.to_path_buf(),
                        reason: format!(
                            "{} has {} weights for {} bins",
                            chrom.name,
                            weights.len(),
                            data.nrows()
                        ),
                    });
                }
                data.indexed_iter_mut()
                    .for_each(|((i, j), v)| *v *= weights[i] * weights[j]);
            }
            (None, true) => warn!("No balancing weights for {}, using raw contacts", chrom.name),
            _ => {}
        }

        debug!("Loaded {} with {} bins", chrom.name, data.nrows());
        matrices.insert(&chrom.name, ContactMatrix::new(&chrom.name, data)?);
    }

    Ok(matrices)
}

/// Cis pixels of one chromosome, in bin coordinates.
#[derive(Default)]
struct PixelBuffer {
    pixels: Vec<(usize, usize, f64)>,
    n_bins: usize,
}

fn load_pixels(path: &Path, balance: bool) -> Result<ChromMatrices> {
    let reader = get_dynamic_reader(path)?;

    let mut order: Vec<String> = Vec::new();
    let mut buffers: HashMap<String, PixelBuffer> = HashMap::default();
    let mut resolution: Option<u64> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("chrom1") {
            continue;
        }
        let parse_error = |reason: String| AvtadIoError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };

        let fields = split_fields(&line);
        if fields.len() < 7 {
            return Err(parse_error(format!("expected at least 7 columns, found {}", fields.len())));
        }
        if balance && fields.len() < 8 {
            return Err(AvtadIoError::BalanceUnavailable(path.to_path_buf()));
        }

        let coord = |k: usize| {
            fields[k]
                .parse::<u64>()
                .map_err(|e| parse_error(format!("column {} {:?}: {}", k + 1, fields[k], e)))
        };
        let (start1, end1, start2, end2) = (coord(1)?, coord(2)?, coord(4)?, coord(5)?);

        let res = match resolution {
            Some(res) => res,
            None => {
                let res = end1.saturating_sub(start1);
                if res == 0 {
                    return Err(parse_error("first pixel has zero width".to_string()));
                }
                resolution = Some(res);
                res
            }
        };

        let (chrom1, chrom2) = (fields[0], fields[3]);
        if chrom1 != chrom2 {
            continue;
        }

        let value_field = if balance { fields[7] } else { fields[6] };
        let value = value_field.parse::<f64>().unwrap_or(f64::NAN);

        if !buffers.contains_key(chrom1) {
            order.push(chrom1.to_string());
        }
        let buffer = buffers.entry(chrom1.to_string()).or_default();

        let (bin1, bin2) = ((start1 / res) as usize, (start2 / res) as usize);
        let last = end1.max(end2).div_ceil(res) as usize;
        buffer.n_bins = buffer.n_bins.max(last);
        buffer.pixels.push((bin1, bin2, value));
    }

    let resolution = resolution.ok_or_else(|| AvtadIoError::Parse {
        path: path.to_path_buf(),
        line: 0,
        reason: "no pixels found".to_string(),
    })?;

    let mut matrices = ChromMatrices::new(resolution);
    for chrom in order {
        let Some(buffer) = buffers.remove(&chrom) else {
            continue;
        };
        let mut data = Array2::<f64>::zeros((buffer.n_bins, buffer.n_bins));
        for (i, j, v) in buffer.pixels {
            data[(i, j)] = v;
            data[(j, i)] = v;
        }
        debug!("Loaded {} with {} bins", chrom, buffer.n_bins);
        matrices.insert(&chrom, ContactMatrix::new(&chrom, data)?);
    }

    Ok(matrices)
}
