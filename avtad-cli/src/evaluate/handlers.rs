use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ArgMatches;
use log::{info, warn};

use avtad_io::{evaluate_header, find_modes, mode_path, read_average, write_average};
use avtad_rescale::Expression;

pub fn run_evaluate(matches: &ArgMatches, timestamp: NaiveDateTime) -> Result<()> {
    // get arguments from CLI
    let a_prefix = matches
        .get_one::<String>("a_prefix")
        .expect("A prefix for matrix a is required.");

    let b_prefix = matches
        .get_one::<String>("b_prefix")
        .expect("A prefix for matrix b is required.");

    let prefix = matches
        .get_one::<String>("output_prefix")
        .expect("An output prefix is required.");

    let expression = matches
        .get_one::<String>("expression")
        .expect("An expression is required.");

    let expression = Expression::parse(expression)?;

    let modes = find_modes(a_prefix)?;
    if modes.is_empty() {
        warn!("No average matrices found for {}.avTAD*.tsv", a_prefix);
    }

    let header = evaluate_header(expression.source(), a_prefix, b_prefix, timestamp);
    let mut written = 0;

    for mode in &modes {
        let a_path = mode_path(a_prefix, mode);
        let b_path = mode_path(b_prefix, mode);
        if !b_path.exists() {
            warn!(
                "Skipping {}: no matching {} for b",
                a_path.display(),
                b_path.display()
            );
            continue;
        }

        let a = read_average(&a_path).with_context(|| format!("Failed to read {}", a_path.display()))?;
        let b = read_average(&b_path).with_context(|| format!("Failed to read {}", b_path.display()))?;
        let result = expression
            .evaluate(a.view(), b.view())
            .with_context(|| format!("Cannot combine {} and {}", a_path.display(), b_path.display()))?;

        let path = mode_path(prefix, mode);
        info!("Saving {} to {} ...", expression, path.display());
        write_average(&path, result.view(), &header)?;
        written += 1;
    }

    info!("Evaluated {} of {} modes", written, modes.len());

    Ok(())
}
