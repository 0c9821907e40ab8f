//! Simulates the snapshot phase of a pipeline and exposes its progress to Prometheus.
//!
//! Tables are "scanned" by concurrent tasks that report into one shared tracker while the
//! metrics publisher samples it. Scrape `http://localhost:9000/metrics` while it runs:
//!
//! ```text
//! APP_ENVIRONMENT=dev cargo run -p etl-examples --bin snapshot -- --table-count 16 --workers 4
//! ```

use clap::Parser;
use tracing::{error, info};

use crate::config::{DemoArgs, DemoConfig, load_demo_config};
use crate::core::run_snapshot;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::parse();
    let demo_config = load_demo_config(&args)?;

    let _log_flusher = etl_telemetry::init_tracing(env!("CARGO_BIN_NAME"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(demo_config))?;

    Ok(())
}

async fn async_main(demo_config: DemoConfig) -> anyhow::Result<()> {
    etl_telemetry::metrics::init_metrics(Some(demo_config.pipeline_id))?;

    match run_snapshot(demo_config).await {
        Ok(progress) => {
            info!(
                progress = %serde_json::to_string(&progress)?,
                "snapshot demo finished"
            );

            Ok(())
        }
        Err(err) => {
            error!("an error occurred in the snapshot demo: {err}");

            Err(err)
        }
    }
}
