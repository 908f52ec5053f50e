//! CLI for the nodegrab batch fetcher.

mod run;
mod shell;

use anyhow::Result;
use clap::Parser;

/// Top-level argument surface: flags only, no subcommands. `-i` drops into
/// the interactive operator shell instead of running one batch.
#[derive(Debug, Parser)]
#[command(name = "nodegrab")]
#[command(about = "nodegrab: batch URL fetcher with proxy validation", long_about = None)]
pub struct Cli {
    /// Output file path.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<String>,

    /// Proxy address (http://host:port or socks5://host:port).
    #[arg(short = 'p', long = "proxy", value_name = "ADDR")]
    pub proxy: Option<String>,

    /// Connect directly, ignoring any configured or default proxy.
    #[arg(long = "no-proxy")]
    pub no_proxy: bool,

    /// Comma-separated list of URLs to fetch.
    #[arg(short = 'u', long = "urls", value_name = "LIST")]
    pub urls: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(short = 't', long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Overall wall-clock budget for the whole batch, in seconds.
    #[arg(short = 'T', long = "total-timeout", value_name = "SECS")]
    pub total_timeout: Option<u64>,

    /// Start the interactive operator shell.
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    if cli.interactive {
        shell::run_shell()
    } else {
        run::run_once(&cli)
    }
}
