mod evaluate;
mod rescale;
mod snip;

use anyhow::Result;
use chrono::Local;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "avtad";
    pub const BIN_NAME: &str = "avtad";
    pub const LOG_ENV: &str = "AVTAD_LOG";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Average TAD plots from Hi-C contact maps, with shuffled segmentation controls.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase logging verbosity (overridden by AVTAD_LOG)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(snip::cli::create_snip_cli())
        .subcommand(rescale::cli::create_rescale_cli())
        .subcommand(evaluate::cli::create_evaluate_cli())
}

/// Log to stderr; `AVTAD_LOG` wins over `-v`.
fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(consts::LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_tracing(matches.get_count("verbose"));

    // one timestamp per run, stamped into every header written
    let timestamp = Local::now().naive_local();

    match matches.subcommand() {
        //
        // SNIP
        //
        Some((snip::cli::SNIP_CMD, matches)) => {
            snip::handlers::run_snip(matches)?;
        }

        //
        // RESCALE
        //
        Some((rescale::cli::RESCALE_CMD, matches)) => {
            rescale::handlers::run_rescale(matches, timestamp)?;
        }

        //
        // EVALUATE
        //
        Some((evaluate::cli::EVALUATE_CMD, matches)) => {
            evaluate::handlers::run_evaluate(matches, timestamp)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_verbose_is_global() {
        let matches = build_parser()
            .try_get_matches_from(["avtad", "evaluate", "A", "B", "OUT", "a-b", "-vv"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
    }
}
