use std::sync::Arc;

use etl_config::shared::PublisherConfig;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::metrics::{publish_snapshot_metrics, register_metrics};
use crate::snapshot::SnapshotMetricsReader;
use crate::types::PipelineId;

/// Starts the monitoring poller of a snapshot tracker.
///
/// The returned task samples `reader` every [`PublisherConfig::interval_ms`] and exports the
/// attributes as gauges through the globally installed `metrics` recorder. It never writes to the
/// tracker. When a shutdown is signalled, it publishes a last sample so that the final state of the
/// snapshot is visible, then exits.
pub fn start_snapshot_metrics_publisher<R>(
    reader: Arc<R>,
    pipeline_id: PipelineId,
    config: PublisherConfig,
    mut shutdown_rx: ShutdownRx,
) -> JoinHandle<()>
where
    R: SnapshotMetricsReader + Send + Sync + ?Sized + 'static,
{
    register_metrics();

    let publisher_span = tracing::info_span!("snapshot_metrics_publisher", pipeline_id);
    let publisher = async move {
        info!(
            interval_ms = config.interval_ms,
            "starting snapshot metrics publisher"
        );

        let mut interval = tokio::time::interval(config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    publish_snapshot_metrics(reader.as_ref(), pipeline_id);
                    info!("shutting down snapshot metrics publisher");

                    return;
                }

                _ = interval.tick() => {
                    debug!("publishing snapshot metrics");
                    publish_snapshot_metrics(reader.as_ref(), pipeline_id);
                }
            }
        }
    }
    .instrument(publisher_span);

    tokio::spawn(publisher)
}
