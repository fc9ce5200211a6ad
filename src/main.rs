//! cryptpool CLI: encrypt or decrypt a directory with a pool of workers.

use anyhow::Result;
use clap::Parser;
use cryptpool::cli::{run, Cli};
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let ok = run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
