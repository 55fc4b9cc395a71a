use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::domain::{FilterConfig, FilterError};
use crate::table::Table;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub kept: Vec<String>,
    pub dropped: Vec<String>,
}

/// Load the input, drop the excluded columns and write the output.
///
/// The output file is only touched once loading and projecting succeeded.
#[instrument(level = "info", skip_all, fields(input = %cfg.input.display(), output = %cfg.output.display()))]
pub fn run(cfg: &FilterConfig) -> Result<Summary, FilterError> {
    let start_time = Instant::now();

    if cfg.excluded.is_empty() {
        warn!("No columns to drop, output is a copy of the input");
    }

    let table = Table::load(&cfg.input, cfg.separator)?;
    let projected = table.project(&cfg.excluded, cfg.policy)?;
    projected.save(&cfg.output, cfg.separator)?;

    let kept = projected.columns();
    let dropped = table
        .columns()
        .into_iter()
        .filter(|c| !kept.contains(c))
        .collect();

    info!(
        "Filtered {} in {}ms",
        table.name(),
        start_time.elapsed().as_millis()
    );
    Ok(Summary {
        input: cfg.input.clone(),
        output: cfg.output.clone(),
        rows: projected.height(),
        kept,
        dropped,
    })
}
