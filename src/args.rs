use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "asntop",
    about = "Look up a list of IP addresses and rank the autonomous systems they belong to",
    version,
    long_about = None
)]
pub struct Args {
    /// File with one IP address per line ("-" reads stdin)
    #[arg(default_value = "input.txt")]
    pub input: PathBuf,

    /// Base URL of the lookup service; the IP is appended as a path segment
    #[arg(long, default_value = "https://apimon.de/ip/")]
    pub endpoint: String,

    /// Attempts per IP before giving up
    #[arg(short, long, default_value_t = 3)]
    pub retries: u32,

    /// Seconds to wait between attempts after a transient failure
    #[arg(long, default_value_t = 5)]
    pub backoff: u64,

    /// Number of top ASNs to display
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,

    /// Maximum number of lookups in flight
    #[arg(short, long, default_value_t = 32)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Print only the final ranking instead of redrawing it live
    #[arg(long)]
    pub plain: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
