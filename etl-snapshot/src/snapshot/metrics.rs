use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::snapshot::state::{SnapshotStateMachine, SnapshotStatus};
use crate::snapshot::tables::{RowsScanned, TableProgressRegistry};
use crate::types::{PipelineId, TableId};

/// Name of the metrics context exposed by [`SnapshotMetrics`].
pub const SNAPSHOT_CONTEXT: &str = "snapshot";

/// Read side of a snapshot tracker, as consumed by monitoring code.
///
/// Every method reads a single attribute. Two calls are not guaranteed to observe the same
/// moment, see [`SnapshotMetricsReader::progress`].
pub trait SnapshotMetricsReader {
    /// Number of tables selected for the current snapshot.
    fn total_table_count(&self) -> usize;

    /// Number of selected tables whose scan was not reported as complete yet.
    fn remaining_table_count(&self) -> usize;

    fn snapshot_running(&self) -> bool;

    fn snapshot_completed(&self) -> bool;

    fn snapshot_aborted(&self) -> bool;

    /// Elapsed seconds of the current or last snapshot, `0` if none was started.
    fn snapshot_duration_secs(&self) -> u64;

    /// Stringified identifiers of the selected tables, in no particular order.
    fn monitored_tables(&self) -> Vec<String>;

    /// Live view of the rows scanned per table.
    fn rows_scanned(&self) -> RowsScanned;

    /// Gathers every attribute into one value.
    ///
    /// Attributes are read one after the other while writers may be active, so the result is not
    /// an atomic snapshot of the tracker.
    fn progress(&self) -> SnapshotProgress {
        let mut monitored_tables = self.monitored_tables();
        monitored_tables.sort_unstable();

        SnapshotProgress {
            total_table_count: self.total_table_count(),
            remaining_table_count: self.remaining_table_count(),
            running: self.snapshot_running(),
            completed: self.snapshot_completed(),
            aborted: self.snapshot_aborted(),
            duration_secs: self.snapshot_duration_secs(),
            monitored_tables,
            rows_scanned: self.rows_scanned().iter().collect(),
        }
    }
}

/// Write side of a snapshot tracker, called by the pipeline as the snapshot progresses.
///
/// None of the methods fail or block. Out of order calls, e.g. completing a table that was never
/// selected, are recorded as is.
pub trait SnapshotProgressListener {
    /// Records the tables selected for the snapshot.
    fn set_monitored_tables(&self, table_ids: &HashSet<TableId>);

    /// Records the final row count of a table and marks it as no longer remaining.
    fn complete_table(&self, table_id: &TableId, rows_scanned: u64);

    fn start_snapshot(&self);

    fn complete_snapshot(&self);

    fn abort_snapshot(&self);

    /// Records an intermediate row count of a table that is still being scanned.
    fn set_rows_scanned(&self, table_id: &TableId, rows_scanned: u64);
}

/// Point-in-time gathering of every attribute of a snapshot tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotProgress {
    pub total_table_count: usize,
    pub remaining_table_count: usize,
    pub running: bool,
    pub completed: bool,
    pub aborted: bool,
    pub duration_secs: u64,
    pub monitored_tables: Vec<String>,
    pub rows_scanned: BTreeMap<String, u64>,
}

/// Identifies which pipeline and which phase a tracker reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsContext {
    pub pipeline_id: PipelineId,
    pub context: &'static str,
}

/// Tracker of the snapshot phase of one pipeline.
///
/// The pipeline creates a single instance, usually behind an [`std::sync::Arc`], and hands it to
/// every worker that reports snapshot events as well as to the monitoring side. All methods take
/// `&self` and are safe to call from any number of threads concurrently.
#[derive(Debug)]
pub struct SnapshotMetrics<C = SystemClock> {
    context: MetricsContext,
    state: SnapshotStateMachine<C>,
    tables: TableProgressRegistry,
}

impl SnapshotMetrics<SystemClock> {
    pub fn new(pipeline_id: PipelineId) -> Self {
        Self::with_clock(pipeline_id, SystemClock)
    }
}

impl<C> SnapshotMetrics<C>
where
    C: Clock,
{
    pub fn with_clock(pipeline_id: PipelineId, clock: C) -> Self {
        Self {
            context: MetricsContext {
                pipeline_id,
                context: SNAPSHOT_CONTEXT,
            },
            state: SnapshotStateMachine::with_clock(clock),
            tables: TableProgressRegistry::new(),
        }
    }

    pub fn context(&self) -> MetricsContext {
        self.context
    }

    pub fn status(&self) -> SnapshotStatus {
        self.state.status()
    }

    /// Does nothing.
    ///
    /// Counters and per-table progress survive a reset; a new run overwrites them through
    /// [`SnapshotProgressListener::start_snapshot`] and
    /// [`SnapshotProgressListener::set_monitored_tables`].
    pub fn reset(&self) {}
}

impl<C> SnapshotMetricsReader for SnapshotMetrics<C>
where
    C: Clock,
{
    fn total_table_count(&self) -> usize {
        self.tables.total_table_count()
    }

    fn remaining_table_count(&self) -> usize {
        self.tables.remaining_table_count()
    }

    fn snapshot_running(&self) -> bool {
        self.state.is_running()
    }

    fn snapshot_completed(&self) -> bool {
        self.state.is_completed()
    }

    fn snapshot_aborted(&self) -> bool {
        self.state.is_aborted()
    }

    fn snapshot_duration_secs(&self) -> u64 {
        self.state.duration_secs()
    }

    fn monitored_tables(&self) -> Vec<String> {
        self.tables.monitored_tables()
    }

    fn rows_scanned(&self) -> RowsScanned {
        self.tables.rows_scanned()
    }
}

impl<C> SnapshotProgressListener for SnapshotMetrics<C>
where
    C: Clock,
{
    fn set_monitored_tables(&self, table_ids: &HashSet<TableId>) {
        info!(
            pipeline_id = self.context.pipeline_id,
            table_count = table_ids.len(),
            "monitoring tables for snapshot"
        );

        self.tables.set_monitored_tables(table_ids);
    }

    fn complete_table(&self, table_id: &TableId, rows_scanned: u64) {
        self.tables.complete_table(table_id, rows_scanned);

        debug!(
            pipeline_id = self.context.pipeline_id,
            %table_id,
            rows_scanned,
            remaining_tables = self.tables.remaining_table_count(),
            "table snapshot completed"
        );
    }

    fn start_snapshot(&self) {
        self.state.start();

        info!(pipeline_id = self.context.pipeline_id, "snapshot started");
    }

    fn complete_snapshot(&self) {
        self.state.complete();

        info!(
            pipeline_id = self.context.pipeline_id,
            duration_secs = self.state.duration_secs(),
            "snapshot completed"
        );
    }

    fn abort_snapshot(&self) {
        self.state.abort();

        info!(
            pipeline_id = self.context.pipeline_id,
            duration_secs = self.state.duration_secs(),
            remaining_tables = self.tables.remaining_table_count(),
            "snapshot aborted"
        );
    }

    fn set_rows_scanned(&self, table_id: &TableId, rows_scanned: u64) {
        self.tables.set_rows_scanned(table_id, rows_scanned);
    }
}
