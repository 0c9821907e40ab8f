use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use etl_snapshot::concurrency::shutdown::{ShutdownRx, create_shutdown_channel};
use etl_snapshot::publisher::start_snapshot_metrics_publisher;
use etl_snapshot::snapshot::{
    SnapshotMetrics, SnapshotMetricsReader, SnapshotProgress, SnapshotProgressListener,
};
use etl_snapshot::types::TableId;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info};

use crate::config::{DemoConfig, SimulationConfig};

/// Schema of the simulated tables.
const SIMULATED_SCHEMA: &str = "public";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ScanOutcome {
    Completed,
    Interrupted,
}

/// Runs a simulated snapshot and returns the progress recorded once it ended.
pub async fn run_snapshot(demo_config: DemoConfig) -> anyhow::Result<SnapshotProgress> {
    let pipeline_id = demo_config.pipeline_id;
    let simulation = demo_config.simulation;
    log_simulation_config(&simulation);

    let tracker = Arc::new(SnapshotMetrics::new(pipeline_id));

    let (publisher_shutdown_tx, publisher_shutdown_rx) = create_shutdown_channel();
    let publisher = start_snapshot_metrics_publisher(
        tracker.clone(),
        pipeline_id,
        demo_config.publisher,
        publisher_shutdown_rx,
    );

    let tables: Vec<TableId> = (0..simulation.table_count)
        .map(|i| TableId::new(SIMULATED_SCHEMA, format!("table_{i}")))
        .collect();

    tracker.start_snapshot();
    tracker.set_monitored_tables(&tables.iter().cloned().collect::<HashSet<_>>());

    let (scan_shutdown_tx, scan_shutdown_rx) = create_shutdown_channel();
    let permits = Arc::new(Semaphore::new(simulation.workers));
    let completed_tables = Arc::new(AtomicUsize::new(0));

    let mut scans = JoinSet::new();
    for table_id in tables {
        let scan_span = tracing::info_span!("table_scan", %table_id);
        scans.spawn(
            scan_table(
                tracker.clone(),
                table_id,
                simulation.clone(),
                permits.clone(),
                completed_tables.clone(),
                scan_shutdown_rx.clone(),
            )
            .instrument(scan_span),
        );
    }

    let mut aborted = false;
    while let Some(result) = scans.join_next().await {
        let outcome = result??;
        debug!(?outcome, "table scan ended");

        if let Some(abort_after_tables) = simulation.abort_after_tables
            && !aborted
            && completed_tables.load(Ordering::SeqCst) >= abort_after_tables
        {
            info!(abort_after_tables, "aborting simulated snapshot");
            aborted = true;
            // Scans that already ended dropped their receivers, a failed send is harmless.
            let _ = scan_shutdown_tx.shutdown();
        }
    }

    if aborted {
        tracker.abort_snapshot();
    } else {
        tracker.complete_snapshot();
    }

    let _ = publisher_shutdown_tx.shutdown();
    publisher.await?;

    Ok(tracker.progress())
}

async fn scan_table(
    tracker: Arc<SnapshotMetrics>,
    table_id: TableId,
    simulation: SimulationConfig,
    permits: Arc<Semaphore>,
    completed_tables: Arc<AtomicUsize>,
    mut shutdown_rx: ShutdownRx,
) -> anyhow::Result<ScanOutcome> {
    let _permit = tokio::select! {
        biased;

        _ = shutdown_rx.changed() => return Ok(ScanOutcome::Interrupted),

        permit = permits.acquire_owned() => permit?,
    };

    let batch_delay = Duration::from_millis(simulation.batch_delay_ms);
    let mut rows_scanned = 0;
    while rows_scanned < simulation.rows_per_table {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                info!(rows_scanned, "table scan interrupted");

                return Ok(ScanOutcome::Interrupted);
            }

            _ = tokio::time::sleep(batch_delay) => {
                rows_scanned = (rows_scanned + simulation.batch_size).min(simulation.rows_per_table);
                tracker.set_rows_scanned(&table_id, rows_scanned);
            }
        }
    }

    tracker.complete_table(&table_id, rows_scanned);
    completed_tables.fetch_add(1, Ordering::SeqCst);

    Ok(ScanOutcome::Completed)
}

fn log_simulation_config(config: &SimulationConfig) {
    debug!(
        table_count = config.table_count,
        rows_per_table = config.rows_per_table,
        batch_size = config.batch_size,
        batch_delay_ms = config.batch_delay_ms,
        workers = config.workers,
        abort_after_tables = config.abort_after_tables,
        "simulation config"
    );
}
