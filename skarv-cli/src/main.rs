//! skarv command-line interface.
//!
//! Thin presentation layer over the capture pipeline: lists devices, runs a
//! timed capture session while polling pipeline statistics, and prints the
//! stored packets afterwards.

use clap::Parser;

mod commands;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    skarv_telemetry::logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Devices => commands::list_devices(),
        Commands::Capture(args) => commands::run_capture(args),
    }
}
