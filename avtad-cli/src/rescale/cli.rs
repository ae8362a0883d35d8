use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const RESCALE_CMD: &str = "rescale";
pub const DEFAULT_RESCALED_SIZE: usize = 200;
pub const DEFAULT_SMOOTH_ORDER: usize = 1;
pub const DEFAULT_OPERATION: &str = "mean";

pub fn create_rescale_cli() -> Command {
    Command::new(RESCALE_CMD)
        .about("Rescale snips to the same size and average them by table index.")
        .long_about(
            "Rescale snips to the same size and average them by table index.\n\n\
             Output files:\n  \
               {OUTPUT_PREFIX}.avTAD.tsv\n\
             or, with --split-by SPLIT_BY, one file per group:\n  \
               {OUTPUT_PREFIX}.avTAD.{SPLIT_BY}:{value}.tsv",
        )
        .arg(
            Arg::new("snips")
                .value_name("INFILE_SNIPS")
                .required(true)
                .help("Snip collection written by `avtad snip`"),
        )
        .arg(
            Arg::new("table")
                .value_name("INFILE_TABLE")
                .required(true)
                .help("Table selecting the snips by index, `-` for stdin"),
        )
        .arg(
            Arg::new("output_prefix")
                .value_name("OUTPUT_PREFIX")
                .required(true),
        )
        .arg(arg!(--"split-by" <column> "Average each group of this table column separately"))
        .arg(
            arg!(--"table-is-not-indexed" "The table has no index column; rows are numbered from 0")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"table-has-no-header" "The table has no header; its first columns are chromosome, start, end")
                .action(ArgAction::SetTrue),
        )
        .arg(arg!(--query <query> "Row filter, e.g. \"size > 20 and size < 30\" or \"chromosome == 'chrX'\""))
        .arg(
            arg!(--"rescaled-size" <size> "Side of the average TAD matrix [default: 200]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"no-save-sum" "Preserve pixel density instead of total intensity when zooming")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"smooth-order" <order> "Interpolation order, 0 to 5 [default: 1]")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--operation <operation> "Pixel-wise reduction: mean, median, sum or count [default: mean]"))
        .arg(arg!(--config <config> "TOML file with defaults for the options above"))
}
