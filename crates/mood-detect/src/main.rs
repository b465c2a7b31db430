//! Emotion detection CLI.
//!
//! Prints one JSON object per image on stdout.

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::info;

use mood_detect::{build_orchestrator, logging, run_batch, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "mood-detect")]
#[command(about = "Detect the mood of faces in image files")]
struct Args {
    /// Images to analyse
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Include the backend attempt log in the output
    #[arg(long)]
    attempts: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let args = Args::parse();
    let config = AppConfig::from_env();
    info!("Detection config: {:?}", config.detection);

    let orchestrator = build_orchestrator(&config)?;

    // Ctrl-C abandons in-flight backend calls and stops the batch
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling backend calls");
            let _ = cancel_tx.send(true);
        }
    });

    let summary = run_batch(&orchestrator, &args.images, args.attempts, cancel_rx, |output| {
        let line = if args.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{}", line);
        Ok::<_, serde_json::Error>(())
    })
    .await?;

    if summary.interrupted() {
        anyhow::bail!("interrupted, {} image(s) not analysed", summary.skipped);
    }
    if summary.failures > 0 {
        anyhow::bail!(
            "{} of {} image(s) could not be analysed",
            summary.failures,
            args.images.len()
        );
    }
    Ok(())
}
