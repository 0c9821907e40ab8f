//! Live progress tracking for the snapshot phase of a change data capture pipeline.
//!
//! The pipeline owns one [`snapshot::SnapshotMetrics`] per task and reports lifecycle
//! transitions and per-table facts into it through [`snapshot::SnapshotProgressListener`].
//! Monitoring code samples it through [`snapshot::SnapshotMetricsReader`], either directly or
//! via the gauge [`publisher`].

pub mod clock;
pub mod concurrency;
pub mod metrics;
pub mod publisher;
pub mod snapshot;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
