use std::sync::Once;

use metrics::{Unit, describe_gauge, gauge};

use crate::snapshot::SnapshotMetricsReader;
use crate::types::PipelineId;

static REGISTER_METRICS: Once = Once::new();

pub const ETL_SNAPSHOT_TABLES_TOTAL: &str = "etl_snapshot_tables_total";
pub const ETL_SNAPSHOT_TABLES_REMAINING: &str = "etl_snapshot_tables_remaining";
pub const ETL_SNAPSHOT_RUNNING: &str = "etl_snapshot_running";
pub const ETL_SNAPSHOT_COMPLETED: &str = "etl_snapshot_completed";
pub const ETL_SNAPSHOT_ABORTED: &str = "etl_snapshot_aborted";
pub const ETL_SNAPSHOT_DURATION_SECONDS: &str = "etl_snapshot_duration_seconds";
pub const ETL_SNAPSHOT_ROWS_SCANNED: &str = "etl_snapshot_rows_scanned";
pub const PIPELINE_ID: &str = "pipeline_id";
pub const TABLE: &str = "table";

/// Registers the descriptions of the snapshot gauges with the installed recorder.
///
/// Safe to call many times, the descriptions are only registered once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_gauge!(
            ETL_SNAPSHOT_TABLES_TOTAL,
            Unit::Count,
            "Number of tables selected for the snapshot"
        );

        describe_gauge!(
            ETL_SNAPSHOT_TABLES_REMAINING,
            Unit::Count,
            "Number of selected tables whose snapshot is not completed yet"
        );

        describe_gauge!(
            ETL_SNAPSHOT_RUNNING,
            "Whether a snapshot is running (1) or not (0)"
        );

        describe_gauge!(
            ETL_SNAPSHOT_COMPLETED,
            "Whether the last snapshot completed (1) or not (0)"
        );

        describe_gauge!(
            ETL_SNAPSHOT_ABORTED,
            "Whether the last snapshot was aborted (1) or not (0)"
        );

        describe_gauge!(
            ETL_SNAPSHOT_DURATION_SECONDS,
            Unit::Seconds,
            "Elapsed time of the current or last snapshot"
        );

        describe_gauge!(
            ETL_SNAPSHOT_ROWS_SCANNED,
            Unit::Count,
            "Rows scanned so far by the snapshot of a table"
        );
    });
}

/// Samples every attribute of `reader` once and sets the matching gauges.
pub fn publish_snapshot_metrics<R>(reader: &R, pipeline_id: PipelineId)
where
    R: SnapshotMetricsReader + ?Sized,
{
    let pipeline_id = pipeline_id.to_string();

    gauge!(ETL_SNAPSHOT_TABLES_TOTAL, PIPELINE_ID => pipeline_id.clone())
        .set(reader.total_table_count() as f64);
    gauge!(ETL_SNAPSHOT_TABLES_REMAINING, PIPELINE_ID => pipeline_id.clone())
        .set(reader.remaining_table_count() as f64);
    gauge!(ETL_SNAPSHOT_RUNNING, PIPELINE_ID => pipeline_id.clone())
        .set(bool_to_gauge(reader.snapshot_running()));
    gauge!(ETL_SNAPSHOT_COMPLETED, PIPELINE_ID => pipeline_id.clone())
        .set(bool_to_gauge(reader.snapshot_completed()));
    gauge!(ETL_SNAPSHOT_ABORTED, PIPELINE_ID => pipeline_id.clone())
        .set(bool_to_gauge(reader.snapshot_aborted()));
    gauge!(ETL_SNAPSHOT_DURATION_SECONDS, PIPELINE_ID => pipeline_id.clone())
        .set(reader.snapshot_duration_secs() as f64);

    for (table, rows) in reader.rows_scanned().iter() {
        gauge!(ETL_SNAPSHOT_ROWS_SCANNED, PIPELINE_ID => pipeline_id.clone(), TABLE => table)
            .set(rows as f64);
    }
}

fn bool_to_gauge(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;
    use crate::snapshot::{SnapshotMetrics, SnapshotProgressListener};
    use crate::test_utils::clock::MockClock;
    use crate::types::TableId;

    #[test]
    fn test_publish_sets_gauges() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let tracker = SnapshotMetrics::with_clock(7, MockClock::new(1_000));
        tracker.start_snapshot();
        tracker.set_monitored_tables(&HashSet::from([
            TableId::new("public", "a"),
            TableId::new("public", "b"),
        ]));
        tracker.complete_table(&TableId::new("public", "a"), 12);

        metrics::with_local_recorder(&recorder, || {
            publish_snapshot_metrics(&tracker, 7);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"etl_snapshot_tables_total{pipeline_id="7"} 2"#));
        assert!(rendered.contains(r#"etl_snapshot_tables_remaining{pipeline_id="7"} 1"#));
        assert!(rendered.contains(r#"etl_snapshot_running{pipeline_id="7"} 1"#));
        assert!(rendered.contains(r#"etl_snapshot_aborted{pipeline_id="7"} 0"#));
        assert!(
            rendered.contains(r#"etl_snapshot_rows_scanned{pipeline_id="7",table="public.a"} 12"#)
        );
    }
}
