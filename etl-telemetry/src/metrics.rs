use std::sync::Mutex;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

/// Global label attached to every exported series.
const PIPELINE_LABEL: &str = "pipeline";

/// Interval between two upkeep runs of the recorder behind [`init_metrics_handle`].
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

// A mutex is used instead of a `OnceLock` because installing the recorder is fallible and
// `OnceLock::get_or_try_init` is still unstable. The recorder is global, so any second install
// fails; tests call `init_metrics_handle` many times.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Installs a global Prometheus recorder and returns a handle that renders its contents.
///
/// The recorder is only installed once, every later call returns a clone of the same handle.
/// A background task periodically runs upkeep on the recorder to bound its memory usage, so this
/// must be called from within a tokio runtime.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(UPKEEP_INTERVAL).await;
            trace!("running metrics upkeep");
            upkeep_handle.run_upkeep();
        }
    });

    Ok(handle)
}

/// Installs a global Prometheus recorder together with an http endpoint at
/// `0.0.0.0:9000/metrics` for scrapers.
///
/// If `pipeline_id` is set, it is attached to every series as the `pipeline` label.
pub fn init_metrics(pipeline_id: Option<u64>) -> Result<(), BuildError> {
    let mut builder = PrometheusBuilder::new();

    if let Some(pipeline_id) = pipeline_id {
        builder = builder.add_global_label(PIPELINE_LABEL, pipeline_id.to_string());
    }

    builder.install()?;

    Ok(())
}
