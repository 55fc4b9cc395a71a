use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};

mod cli;
mod domain;
mod logging;
mod pipeline;
mod table;

use cli::Args;
use domain::FilterError;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Err(e) => {
            eprintln!("Error: {e}");
            debug!("Span trace:\n{}", e.span_trace());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: &Args) -> Result<(), FilterError> {
    let cfg = args.to_config();
    info!(
        "Dropping {} columns [{}] from {}",
        cfg.excluded.len(),
        cfg.excluded,
        cfg.input.display()
    );

    let summary = pipeline::run(&cfg)?;
    info!(
        "Kept {} columns, dropped [{}], {} rows from {}",
        summary.kept.len(),
        summary.dropped.join(","),
        summary.rows,
        summary.input.display()
    );

    println!(
        "Unnecessary columns removed and saved to '{}'.",
        summary.output.display()
    );
    Ok(())
}
