//! chipsim: load and inspect fake device topologies.
//!
//! Builds a [`Device`] from a topology file exactly as a test harness would,
//! reports what was registered and prints the resulting device snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chip_sdk::ChipSdk;
use chip_sdk_stub::{Device, DeviceConfig};
use clap::Parser;
use log::{error, info};

/// Fake switch chip device loader
#[derive(Parser, Debug)]
#[command(name = "chipsim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Topology file (JSON)
    #[arg(short = 't', long)]
    topology: PathBuf,

    /// Check the topology without printing the device snapshot
    #[arg(long)]
    validate_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = DeviceConfig::load(&args.topology)
        .with_context(|| format!("failed to load {}", args.topology.display()))?;
    let device = Device::from_config(&config).context("topology rejected")?;

    info!(
        "Device ready: {} of {} chips",
        device.chip_count(),
        device.capacity()
    );
    for chip in device.init()? {
        info!("  chip {}: {} ports", chip.chip_id, chip.port_count());
    }

    if !args.validate_only {
        println!("{}", serde_json::to_string_pretty(&device.snapshot())?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
