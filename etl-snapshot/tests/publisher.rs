use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use etl_config::shared::PublisherConfig;
use etl_snapshot::concurrency::shutdown::create_shutdown_channel;
use etl_snapshot::publisher::start_snapshot_metrics_publisher;
use etl_snapshot::snapshot::{SnapshotMetrics, SnapshotProgressListener};
use etl_snapshot::test_utils::clock::MockClock;
use etl_snapshot::types::TableId;
use etl_telemetry::init_test_tracing;
use etl_telemetry::metrics::init_metrics_handle;

#[tokio::test(flavor = "multi_thread")]
async fn publisher_exports_final_state_on_shutdown() {
    init_test_tracing();
    let handle = init_metrics_handle().unwrap();

    let pipeline_id = 101;
    let tracker = Arc::new(SnapshotMetrics::with_clock(pipeline_id, MockClock::new(1_000)));
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let publisher = start_snapshot_metrics_publisher(
        tracker.clone(),
        pipeline_id,
        PublisherConfig { interval_ms: 10 },
        shutdown_rx,
    );

    tracker.start_snapshot();
    tracker.set_monitored_tables(&HashSet::from([
        TableId::new("public", "users"),
        TableId::new("public", "orders"),
    ]));
    tracker.complete_table(&TableId::new("public", "users"), 5);
    tracker.complete_table(&TableId::new("public", "orders"), 8);
    tracker.complete_snapshot();

    shutdown_tx.shutdown().unwrap();
    publisher.await.unwrap();

    let rendered = handle.render();
    assert!(rendered.contains(r#"etl_snapshot_tables_remaining{pipeline_id="101"} 0"#));
    assert!(rendered.contains(r#"etl_snapshot_completed{pipeline_id="101"} 1"#));
    assert!(rendered.contains(r#"etl_snapshot_running{pipeline_id="101"} 0"#));
    assert!(
        rendered.contains(r#"etl_snapshot_rows_scanned{pipeline_id="101",table="public.orders"} 8"#)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn publisher_samples_while_snapshot_runs() {
    init_test_tracing();
    let handle = init_metrics_handle().unwrap();

    let pipeline_id = 102;
    let tracker = Arc::new(SnapshotMetrics::with_clock(pipeline_id, MockClock::new(1_000)));
    tracker.start_snapshot();
    tracker.set_monitored_tables(&HashSet::from([TableId::new("public", "events")]));
    tracker.set_rows_scanned(&TableId::new("public", "events"), 33);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let publisher = start_snapshot_metrics_publisher(
        tracker.clone(),
        pipeline_id,
        PublisherConfig { interval_ms: 5 },
        shutdown_rx,
    );

    let expected = r#"etl_snapshot_rows_scanned{pipeline_id="102",table="public.events"} 33"#;
    let mut published = false;
    for _ in 0..200 {
        if handle.render().contains(expected) {
            published = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(published);
    assert!(handle
        .render()
        .contains(r#"etl_snapshot_running{pipeline_id="102"} 1"#));

    shutdown_tx.shutdown().unwrap();
    publisher.await.unwrap();
}
