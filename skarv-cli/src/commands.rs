use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use skarv_analysis::Analyzer;
use skarv_capture::{LiveCapture, PacketSource};
use skarv_core::Pipeline;

/// Poll cadence of the presentation loop; the pipeline pushes nothing, the
/// UI side pulls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List capture devices
    Devices,
    /// Capture packets on an interface for a fixed duration
    Capture(CaptureArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Network interface to capture from (eth0, wlan0, ...)
    #[arg(short, long)]
    pub interface: String,

    /// Capture duration in seconds
    #[arg(short, long, default_value_t = 10)]
    pub duration: u64,

    /// Worker threads for packet analysis
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Maximum number of packets to print afterwards
    #[arg(long, default_value_t = 25)]
    pub limit: usize,
}

pub fn list_devices() -> anyhow::Result<()> {
    let source = LiveCapture::new();
    let devices = source.devices().context("failed to list devices")?;
    if devices.is_empty() {
        println!("no capture devices found");
        return Ok(());
    }
    for device in devices {
        println!("{:<16} {}", device.name, device.description);
    }
    Ok(())
}

pub fn run_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(LiveCapture::new(), Analyzer::new(), args.workers);

    pipeline
        .start(&args.interface)
        .with_context(|| format!("failed to start capture on '{}'", args.interface))?;

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
        if last_report.elapsed() >= Duration::from_secs(1) {
            info!(
                captured = pipeline.captured_count(),
                processed = pipeline.processed_count(),
                queued = pipeline.queue_depth(),
                "capture in progress"
            );
            last_report = Instant::now();
        }
    }

    pipeline.stop();
    info!(
        captured = pipeline.captured_count(),
        processed = pipeline.processed_count(),
        "capture finished"
    );

    let store = pipeline.store();
    let packets = store.snapshot();
    println!(
        "{:>6}  {:<10} {:<24} {:<24} {:>6}  info",
        "id", "protocol", "source", "destination", "bytes"
    );
    for packet in packets.iter().take(args.limit) {
        println!(
            "{:>6}  {:<10} {:<24} {:<24} {:>6}  {}",
            packet.id,
            packet.protocol,
            packet.src,
            packet.dst,
            packet.frame_len,
            packet.info
        );
    }
    if packets.len() > args.limit {
        println!("... {} more", packets.len() - args.limit);
    }

    Ok(())
}
