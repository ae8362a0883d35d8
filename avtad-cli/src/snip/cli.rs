use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const SNIP_CMD: &str = "snip";
pub const DEFAULT_FORMAT: &str = "dense";
pub const DEFAULT_NITER: usize = 0;
pub const DEFAULT_WINDOW: f64 = 1.0;
pub const DEFAULT_DIAGONALS_TO_REMOVE: usize = 1;

pub fn create_snip_cli() -> Command {
    Command::new(SNIP_CMD)
        .about("Create snips for TADs and calculate their enrichment, with shuffled controls.")
        .long_about(
            "Create snips for TADs and calculate their enrichment, with shuffled controls.\n\n\
             Output files:\n  \
               {OUTPUT_PREFIX}.TADmetadata.tsv\n\
             unless --enrichment-only:\n  \
               {OUTPUT_PREFIX}.TADsnips.bin\n  \
               {OUTPUT_PREFIX}.TADsnips_shuf0.bin etc.",
        )
        .arg(
            Arg::new("intervals")
                .value_name("TAD_SEGMENTATION_BED")
                .required(true)
                .help("BED-like file of TADs (chrom, start, end, extra columns), plain or gzipped"),
        )
        .arg(
            Arg::new("map")
                .value_name("INPUT_MAP")
                .required(true)
                .help("Contact map: TOML manifest (dense) or pixel dump (pixels)"),
        )
        .arg(
            Arg::new("output_prefix")
                .value_name("OUTPUT_PREFIX")
                .required(true),
        )
        .arg(arg!(-f --format <format> "Contact map format: dense or pixels [default: dense]"))
        .arg(
            arg!(--"no-balance" "Use raw contacts instead of the map's balanced values")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-n --niter <niter> "Number of shuffled segmentation controls [default: 0]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-w --window <window> "Flank size in TAD units on each side [default: 1]")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            arg!(-d --"diagonals-to-remove" <diagonals> "Number of diagonals to mask [default: 1]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"enrichment-only" "Only write the metadata table, skip the snip collections")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--seed <seed> "Seed for reproducible shuffling")
                .value_parser(value_parser!(u64)),
        )
        .arg(arg!(--config <config> "TOML file with defaults for the options above"))
}
