pub mod metrics;
pub mod state;
pub mod tables;

pub use metrics::{
    MetricsContext, SnapshotMetrics, SnapshotMetricsReader, SnapshotProgress,
    SnapshotProgressListener,
};
pub use state::{SnapshotStateMachine, SnapshotStatus};
pub use tables::{RowsScanned, TableProgressRegistry};
