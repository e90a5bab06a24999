//! `ferrite-fit`: train one model on a CSV file, print per-epoch progress
//! and the metrics report, and optionally write a live plot and a model
//! cache.

use std::process::ExitCode;

use clap::Parser;
use ferrite_fit::cli::{init_tracing, parse_args, RunArgs};
use ferrite_fit::{pipeline, PauseToken};

#[derive(Parser)]
#[command(name = "ferrite-fit", version, about = "Train and evaluate a model on tabular CSV data")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> ExitCode {
    init_tracing();
    let cli: Cli = match parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let result = cli.run.into_config().and_then(|config| pipeline::run(&config, &PauseToken::new(), None));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}
