//! Command-line arguments for the MtApi demo client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use mtapi_common::net::DEFAULT_PORT;
use mtapi_common::types::ChartPeriod;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Terminal host name or IP address. Ignored with `--local`.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Terminal command port.
    #[clap(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connect to the terminal on this machine.
    #[clap(long)]
    pub local: bool,

    /// Chart period used for the bar summary.
    #[clap(long, value_enum, default_value = "h1")]
    pub period: ChartPeriod,

    /// Seconds to wait for each command reply. Zero waits forever.
    #[clap(long, default_value_t = 10)]
    pub command_timeout: u64,
}
