//! Command-line front end: directory walk, key lookup, batch run.

mod args;
mod jobs;
mod logger;

pub use args::Cli;
pub use jobs::collect_jobs;
pub use logger::setup_logging;

use crate::pool::{run_batch, PoolConfig};
use crate::transform::{load_key, XorCipher};
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Run one batch as described by `cli`.
///
/// Returns `Ok(true)` when every job and worker succeeded.
pub fn run(cli: &Cli) -> Result<bool> {
    setup_logging(cli.verbose);

    let jobs = collect_jobs(&cli.dir, cli.action)?;
    if jobs.is_empty() {
        info!("No files under {}", cli.dir.display());
        return Ok(true);
    }

    let key = load_key(Some(&cli.dir))?;
    let cipher = Arc::new(XorCipher::from_key(&key));

    let mut config = PoolConfig::new(cli.workers.unwrap_or(0)).with_queue_capacity(cli.capacity);
    if let Some(ms) = cli.poll_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }

    info!("{} {} files", cli.action, jobs.len());
    let result = run_batch(config, jobs, cipher).context("running batch")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result);
    }
    Ok(result.is_success())
}
