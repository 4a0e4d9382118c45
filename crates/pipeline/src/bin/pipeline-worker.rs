//! pipeline-worker — runs the detection pipeline over readings fed as
//! JSON lines on stdin, one `Reading` per line.
//!
//! Useful for replaying captured sensor data against the live rule
//! catalog and reasoning config. Alerts go to in-memory stores; pushed
//! frames are logged. The final `PipelineState` for each reading is
//! printed as JSON on stdout.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use regmon_alert::{AlertComposer, MemoryAlertStore, MemoryStatusSink};
use regmon_analysis::RootCauseResolver;
use regmon_core::{config, Reading};
use regmon_detect::{StaticBaselineProvider, ZScoreDetector};
use regmon_notify::{Broadcaster, Observer, SendError};
use regmon_pipeline::Pipeline;

// ── CLI ─────────────────────────────────────────────────────────────

/// Replay sensor readings through the detection pipeline.
#[derive(Parser, Debug)]
#[command(name = "pipeline-worker", version, about)]
struct Cli {
    /// Emit per-stage state snapshots instead of only the final state.
    #[arg(long, default_value_t = false)]
    traced: bool,
}

// ── Logging observer ────────────────────────────────────────────────

/// Stand-in observer that logs every pushed frame.
struct LogObserver;

#[async_trait]
impl Observer for LogObserver {
    async fn send(&self, frame: &str) -> Result<(), SendError> {
        info!(frame, "observer frame");
        Ok(())
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    config::load_dotenv();
    let cfg = config::Config::from_env();
    cfg.log_summary();

    let detector = Arc::new(ZScoreDetector::new(
        Arc::new(StaticBaselineProvider),
        cfg.detection.threshold,
    ));
    let resolver = RootCauseResolver::from_config(&cfg.llm, &cfg.ollama)?;
    let composer = AlertComposer::new(
        Arc::new(MemoryAlertStore::new()),
        Arc::new(MemoryStatusSink::new()),
    );

    let broadcaster = Arc::new(Broadcaster::new());
    broadcaster.register("log", Box::new(LogObserver)).await;

    let pipeline = Pipeline::new(
        detector,
        Arc::new(resolver),
        Arc::new(composer),
        broadcaster,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut processed = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reading: Reading = match serde_json::from_str(&line) {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "skipping malformed reading");
                continue;
            }
        };

        let device_id = reading.device_id.clone();
        if cli.traced {
            let (_, snapshots) = pipeline.run_traced(&device_id, reading).await;
            for snapshot in &snapshots {
                println!("{}", serde_json::to_string(snapshot)?);
            }
        } else {
            let state = pipeline.run(&device_id, reading).await;
            println!("{}", serde_json::to_string(&state)?);
        }
        processed += 1;
    }

    info!(processed, "worker done");
    Ok(())
}
