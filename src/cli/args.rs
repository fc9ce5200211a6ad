use crate::core::Action;
use clap::Parser;
use std::path::PathBuf;

/// Encrypt or decrypt every regular file under a directory in parallel.
#[derive(Clone, Debug, Parser)]
#[command(name = "cryptpool", version)]
#[command(about = "Encrypt or decrypt every file under DIR with a pool of workers.")]
pub struct Cli {
    /// Directory to process (recursively).
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// encrypt or decrypt (any case).
    #[arg(value_name = "ACTION", value_parser = parse_action)]
    pub action: Action,

    /// Number of worker threads. Default: number of CPUs.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Job queue capacity.
    #[arg(long, short = 'c', default_value_t = crate::queue::DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Poll the queue every N milliseconds instead of blocking.
    #[arg(long, value_name = "N")]
    pub poll_ms: Option<u64>,

    /// Print the batch result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

fn parse_action(s: &str) -> Result<Action, String> {
    s.parse::<Action>().map_err(|_| format!("expected encrypt or decrypt, got '{}'", s))
}
