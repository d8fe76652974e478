use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;

use glucoled::config::OutputSettings;
use glucoled::monitor::shutdown_on;
use glucoled::{
    logging, LibreLinkSource, LogOutput, MonitorLoop, OutputKind, Settings, SignalOutput,
};

#[derive(Parser, Debug)]
#[command(name = "glucoled")]
#[command(about = "Show the latest glucose reading as a light pattern")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log light changes instead of driving a GPIO pin
    #[arg(long)]
    dry_run: bool,

    /// BCM pin number driving the light
    #[arg(long)]
    pin: Option<u8>,

    /// Seconds between fetches after a valid reading
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level used when RUST_LOG is not set (e.g. "debug", "glucoled=trace")
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load settings")?;
    apply_overrides(&mut settings, &args);

    logging::init_logging(&settings.log.level).context("failed to initialise logging")?;

    let credentials = settings.credentials()?;
    let client = settings
        .librelink_client()
        .context("failed to build LibreLinkUp client")?;
    let source = LibreLinkSource::new(client, credentials);
    let output = build_output(&settings.output)?;

    let monitor = MonitorLoop::new(source, output)
        .with_thresholds(settings.thresholds())
        .with_timing(settings.monitor_timing());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(shutdown_on(tokio::signal::ctrl_c(), shutdown_tx));

        monitor.run(shutdown_rx).await;
    });

    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if args.dry_run {
        settings.output.kind = OutputKind::Log;
    }
    if let Some(pin) = args.pin {
        settings.output.pin = pin;
    }
    if let Some(interval) = args.interval {
        settings.monitor.poll_interval_secs = interval;
    }
    if let Some(level) = &args.log_level {
        settings.log.level = level.clone();
    }
}

fn build_output(settings: &OutputSettings) -> Result<Arc<dyn SignalOutput>> {
    match settings.kind {
        OutputKind::Log => Ok(Arc::new(LogOutput::new())),
        OutputKind::Gpio => gpio_output(settings),
    }
}

#[cfg(feature = "gpio")]
fn gpio_output(settings: &OutputSettings) -> Result<Arc<dyn SignalOutput>> {
    let output = glucoled::GpioOutput::new(settings.pin, settings.frequency_hz)
        .with_context(|| format!("failed to claim GPIO pin {}", settings.pin))?;
    Ok(Arc::new(output))
}

#[cfg(not(feature = "gpio"))]
fn gpio_output(_settings: &OutputSettings) -> Result<Arc<dyn SignalOutput>> {
    anyhow::bail!("built without GPIO support; use --dry-run or set output.kind = \"log\"")
}
