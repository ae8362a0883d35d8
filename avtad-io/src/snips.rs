use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use avtad_core::models::{Snip, Variant};

use crate::error::Result;

///
/// Path of the snip collection of one variant: `{prefix}.TADsnips{suffix}.bin`.
pub fn snips_path(prefix: &str, variant: Variant) -> PathBuf {
    PathBuf::from(format!("{}.TADsnips{}.bin", prefix, variant.suffix()))
}

///
/// Serialize a snip collection with bincode.
///
/// # Arguments
/// - path: the path to the file to dump to
/// - snips: snips in interval-table row order
pub fn write_snips<P: AsRef<Path>>(path: P, snips: &[Snip]) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        warn!("File {} exists, it will be overwritten!", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut out, snips)?;
    out.flush()?;
    Ok(())
}

/// Load a snip collection written by [write_snips].
pub fn read_snips(path: &Path) -> Result<Vec<Snip>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}
