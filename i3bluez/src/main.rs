/*!
 * i3bluez
 * i3status wrapper that puts Bluetooth devices in front of the bar
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{error, info};

mod bluetooth;
mod config;
mod error;
mod feed;
mod item;
mod merger;

use bluetooth::BluezClient;
use config::Settings;
use error::BarError;
use feed::StatusFeed;
use merger::{write_preamble, Merger};

#[derive(Parser)]
#[command(name = "i3bluez")]
#[command(about = "i3status wrapper that prepends Bluetooth device state", version)]
struct Cli {
    /// Path to the original i3status config file
    #[arg(short = 'c', default_value = "")]
    config: String,

    /// Wrapper settings file (TOML)
    #[arg(long)]
    settings: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout belongs to i3bar
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("i3bluez={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("i3bluez starting...");

    let settings = Settings::load(cli.settings.as_deref())?;
    info!(
        "Status command {}, device service {} ({:?} API)",
        settings.command, settings.bluetooth.service, settings.bluetooth.api
    );

    let mut stdout = tokio::io::stdout();
    write_preamble(&mut stdout).await?;

    let (resource, conn) =
        dbus_tokio::connection::new_system_sync().context("failed to connect to the system bus")?;
    let bus = BluezClient::new(conn, &settings.bluetooth)?;

    let (tx, rx) = mpsc::channel(1);
    let feed = StatusFeed::spawn(&settings.command, &cli.config, tx)?;

    let merger = Merger::new(bus, stdout);

    tokio::select! {
        lost = resource => Err(BarError::BusLost(lost.to_string()).into()),
        result = merger.run_with_feed(rx, feed) => result.map_err(Into::into),
    }
}
