use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use smppgw::bootstrap::{wait_for_signal, Server, Shutdown};
use smppgw::config::Config;
use smppgw::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "smppgw")]
#[command(author, version, about = "Standalone SMPP 3.4 server with broker-bridged delivery")]
struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Validate config and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (to get log settings)
    let config = Config::load(&args.config)?;

    init_tracing(&config.telemetry)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "starting smppgw"
    );

    if args.validate {
        info!("configuration is valid");
        return Ok(());
    }

    let shutdown = Shutdown::new();
    let server = Server::new(config, shutdown.clone()).await?;

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received, starting graceful shutdown");
        signal_shutdown.trigger();
    });

    server.run().await?;

    Ok(())
}
