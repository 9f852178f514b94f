use clap::Parser;
use colored::*;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use thermocam_live::cli::Args;
use thermocam_live::{ConnectionManager, LiveView, ViewerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ViewerConfig::resolve(&args)?;
    let connection = config.connection()?;

    eprintln!(
        "{} {} {} {}",
        "thermocam-live".bold().cyan(),
        connection.url.bright_white(),
        format!("layout {}", config.layout).dimmed(),
        format!("retry {} ms", config.reconnect_ms).dimmed(),
    );
    if let Some(path) = &config.snapshot {
        eprintln!("  {} {}", "snapshot".green(), path.display());
    }

    let mut live = LiveView::new(config.layout);
    if let Some(path) = &config.snapshot {
        live = live.with_snapshot(path);
    }

    let manager = ConnectionManager::new(connection);
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                let _ = stop_tx.send(true);
            }
            // Dropping the sender leaves the loop running until the process is killed.
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    let attempts = manager.run(&mut live, stop_rx).await;
    info!(
        attempts,
        batches = live.renderer().counter(),
        panels = live.renderer().page().panels().len(),
        "live view stopped"
    );

    Ok(())
}
