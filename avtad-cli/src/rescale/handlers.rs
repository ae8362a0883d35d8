use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ArgMatches;
use indicatif::ProgressBar;
use log::{info, warn};

use avtad_io::{
    Query, RescaleRun, RunConfig, Table, TableLayout, average_path, read_snips, rescale_header, write_average,
};
use avtad_rescale::{Reducer, RescaleParams, average};

use super::cli::*;

pub fn run_rescale(matches: &ArgMatches, timestamp: NaiveDateTime) -> Result<()> {
    // get arguments from CLI
    let snips_file = matches
        .get_one::<String>("snips")
        .expect("A path to a snip collection is required.");

    let table_file = matches
        .get_one::<String>("table")
        .expect("A path to a table is required.");

    let prefix = matches
        .get_one::<String>("output_prefix")
        .expect("An output prefix is required.");

    let config = match matches.get_one::<String>("config") {
        Some(path) => RunConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to read run configuration {}", path))?,
        None => RunConfig::default(),
    };
    let defaults = config.rescale;

    let size = matches
        .get_one::<usize>("rescaled-size")
        .copied()
        .or(defaults.rescaled_size)
        .unwrap_or(DEFAULT_RESCALED_SIZE);
    let preserve_sum = !matches.get_flag("no-save-sum") && defaults.save_sum.unwrap_or(true);
    let order = matches
        .get_one::<usize>("smooth-order")
        .copied()
        .or(defaults.smooth_order)
        .unwrap_or(DEFAULT_SMOOTH_ORDER);
    let operation = matches
        .get_one::<String>("operation")
        .cloned()
        .or(defaults.operation)
        .unwrap_or_else(|| DEFAULT_OPERATION.to_string());
    let split_by = matches.get_one::<String>("split-by");
    let query = matches.get_one::<String>("query");
    let layout = TableLayout {
        indexed: !matches.get_flag("table-is-not-indexed"),
        has_header: !matches.get_flag("table-has-no-header"),
    };

    // everything that can be rejected up front is rejected before reading
    let reducer: Reducer = operation.parse()?;
    let params = RescaleParams::square(size, preserve_sum, order);
    params.validate()?;
    let query = query.map(|q| Query::parse(q)).transpose()?;

    info!("Loading snips from {} ...", snips_file);
    let snips = read_snips(Path::new(snips_file))
        .with_context(|| format!("Failed to read snips {}", snips_file))?;

    info!("Loading table {} ...", table_file);
    let mut table = Table::read(table_file, layout)
        .with_context(|| format!("Failed to read table {}", table_file))?;

    if let Some(query) = &query {
        table = table.filter(query)?;
        info!("Query {:?} keeps {} rows", query.source(), table.len());
    }

    if let Some(&max) = table.index.iter().max() {
        if max >= snips.len() {
            anyhow::bail!(
                "Table {} indexes row {} but {} holds only {} snips; were they produced by the same run?",
                table_file,
                max,
                snips_file,
                snips.len()
            );
        }
    }
    if table.is_empty() {
        warn!("No rows selected from {}, the average will be empty", table_file);
    }

    let run = RescaleRun {
        snips: snips_file,
        table: table_file,
        query: query.as_ref().map(Query::source),
        operation: reducer.name(),
        timestamp,
    };

    match split_by {
        None => {
            let matrix = average(&snips, &table.index, &params, reducer)?;
            let path = average_path(prefix, None);
            info!("Saving average of {} snips to {} ...", table.len(), path.display());
            write_average(&path, matrix.view(), &rescale_header(&run, table.len(), None))?;
        }
        Some(column) => {
            let groups = table.group_by(column)?;
            info!("Splitting {} rows by {} into {} groups", table.len(), column, groups.len());

            let bar = ProgressBar::new(groups.len() as u64);
            for (value, indices) in &groups {
                let group = Some((column.as_str(), value.as_str()));
                let matrix = average(&snips, indices, &params, reducer)?;

                let path = average_path(prefix, group);
                info!("Saving average of {} snips to {} ...", indices.len(), path.display());
                write_average(&path, matrix.view(), &rescale_header(&run, indices.len(), group))?;
                bar.inc(1);
            }
            bar.finish();
        }
    }

    Ok(())
}
