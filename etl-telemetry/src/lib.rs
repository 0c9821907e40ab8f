//! Logging and metrics exporter setup shared by the snapshot metrics binaries and tests.

pub mod metrics;
pub mod tracing;

pub use self::tracing::{LogFlusher, TracingError, init_test_tracing, init_tracing};
