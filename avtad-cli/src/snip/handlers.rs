use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::ProgressBar;
use log::info;

use avtad_core::models::MatrixSource;
use avtad_io::{
    MapFormat, RunConfig, load_matrices, metadata_path, read_intervals, snips_path, write_metadata, write_snips,
};
use avtad_snip::extract::validate_window;
use avtad_snip::{extract_snips, generate_layouts, summarize_variants};

use super::cli::*;

pub fn run_snip(matches: &ArgMatches) -> Result<()> {
    // get arguments from CLI
    let intervals = matches
        .get_one::<String>("intervals")
        .expect("A path to a TAD segmentation is required.");

    let map = matches
        .get_one::<String>("map")
        .expect("A path to a contact map is required.");

    let prefix = matches
        .get_one::<String>("output_prefix")
        .expect("An output prefix is required.");

    let config = match matches.get_one::<String>("config") {
        Some(path) => RunConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to read run configuration {}", path))?,
        None => RunConfig::default(),
    };
    let defaults = config.snip;

    // flags first, then the config file, then built-in defaults
    let format: MapFormat = matches
        .get_one::<String>("format")
        .cloned()
        .or(defaults.format)
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
        .parse()?;
    let balance = !matches.get_flag("no-balance") && defaults.balance.unwrap_or(true);
    let niter = matches
        .get_one::<usize>("niter")
        .copied()
        .or(defaults.niter)
        .unwrap_or(DEFAULT_NITER);
    let window = matches
        .get_one::<f64>("window")
        .copied()
        .or(defaults.window)
        .unwrap_or(DEFAULT_WINDOW);
    let diagonals_to_remove = matches
        .get_one::<usize>("diagonals-to-remove")
        .copied()
        .or(defaults.diagonals_to_remove)
        .unwrap_or(DEFAULT_DIAGONALS_TO_REMOVE);
    let seed = matches.get_one::<u64>("seed").copied().or(defaults.seed);
    let enrichment_only = matches.get_flag("enrichment-only");

    validate_window(window)?;

    info!(
        "Running snipping for: segmentation file {}, heatmap {} in {} format ...",
        intervals, map, format
    );

    let mut matrices = load_matrices(Path::new(map), format, balance)
        .with_context(|| format!("Failed to load contact map {}", map))?;

    info!("Reading segmentation file: {}", intervals);
    let set = read_intervals(Path::new(intervals), matrices.resolution)
        .with_context(|| format!("Failed to read segmentation {}", intervals))?;
    info!("{}", set);

    let used: Vec<&str> = set.iter_chroms().collect();
    if let Some(missing) = used.iter().find(|chrom| matrices.matrix(chrom).is_none()) {
        anyhow::bail!(
            "Chromosome {} of {} is not in {}. Available chromosomes are: {:?}",
            missing,
            intervals,
            map,
            matrices.chroms
        );
    }
    matrices.retain(&used);
    info!(
        "Lengths of chromosomes in bins of {} bp: {:?}",
        matrices.resolution,
        matrices.lengths()
    );

    let matrices = matrices.prepare(diagonals_to_remove);

    let layouts = generate_layouts(&set, niter, seed)?;
    let summaries = summarize_variants(&set, &layouts, &matrices)?;

    let metadata = metadata_path(prefix);
    info!("Saving enrichment table to {} ...", metadata.display());
    write_metadata(&metadata, &set, &summaries)?;

    if enrichment_only {
        return Ok(());
    }

    let chroms = set.chroms();
    let bar = ProgressBar::new(layouts.len() as u64);
    for layout in &layouts {
        let snips = extract_snips(&chroms, &layout.spans, &matrices, window)?;

        let path = snips_path(prefix, layout.variant);
        info!("Saving {} snips ({}) to {} ...", snips.len(), layout.variant, path.display());
        write_snips(&path, &snips)?;
        bar.inc(1);
    }
    bar.finish();

    Ok(())
}
