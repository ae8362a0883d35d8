use clap::{Arg, Command};

pub const EVALUATE_CMD: &str = "evaluate";

pub fn create_evaluate_cli() -> Command {
    Command::new(EVALUATE_CMD)
        .about("Combine the average TAD matrices of two prefixes with an arithmetic expression.")
        .long_about(
            "Combine the average TAD matrices of two prefixes with an arithmetic expression.\n\
             Every {A_PREFIX}.avTAD*.tsv with a matching B_PREFIX file is evaluated.\n\n\
             Example:\n  \
               avtad evaluate OSC OSC_shuf0 OSC_enrichment \"a-b\"",
        )
        .arg(Arg::new("a_prefix").value_name("A_PREFIX").required(true))
        .arg(Arg::new("b_prefix").value_name("B_PREFIX").required(true))
        .arg(Arg::new("output_prefix").value_name("OUTPUT_PREFIX").required(true))
        .arg(
            Arg::new("expression")
                .value_name("EXPRESSION")
                .required(true)
                .allow_hyphen_values(true)
                .help("Expression over a and b using + - * / and parentheses"),
        )
}
