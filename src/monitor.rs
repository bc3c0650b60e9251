//! Periodic refresh scheduling.

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::{
    cluster::Cluster,
    pipeline::{self, RefreshError, RefreshOptions},
    publisher::SnapshotPublisher,
    registry::BrokerRegistry,
    sink::{SnapshotSink, persist},
    snapshot::Snapshot,
};

/// Drives refresh cycles and hands their results to readers and the sink.
pub struct Monitor<C, S>
where
    C: Cluster,
{
    cluster: C,
    registry: BrokerRegistry<C::Broker>,
    sink: Option<S>,
    publisher: Arc<SnapshotPublisher>,
    options: RefreshOptions,
}

impl<C, S> std::fmt::Debug for Monitor<C, S>
where
    C: Cluster,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("brokers", &self.registry.addrs())
            .field("sink", &self.sink.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C, S> Monitor<C, S>
where
    C: Cluster,
    S: SnapshotSink,
{
    pub fn new(cluster: C, publisher: Arc<SnapshotPublisher>, options: RefreshOptions) -> Self {
        Self {
            cluster,
            registry: BrokerRegistry::default(),
            sink: None,
            publisher,
            options,
        }
    }

    /// Persist every published snapshot to `sink`.
    pub fn with_sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs one cycle: ping the sink, refresh, summarize, publish, persist.
    pub async fn tick(&mut self) -> Result<Arc<Snapshot>, RefreshError> {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.ping().await {
                warn!(%e, "Cannot reach persistence sink");
            }
        }

        let builder = pipeline::refresh(&self.cluster, &mut self.registry, &self.options).await?;
        let snapshot = self.publisher.publish(builder.summarize());

        if let Some(sink) = &self.sink {
            let failed = persist(sink, &snapshot).await;
            if failed > 0 {
                warn!(failed, "Snapshot partially persisted");
            }
        }

        Ok(snapshot)
    }

    /// Ticks every `interval` until a fatal error occurs.
    ///
    /// The first tick fires one interval after the call. A cycle that outlasts the interval delays the next one
    /// instead of overlapping with it.
    pub async fn run(&mut self, interval: Duration) -> Result<(), RefreshError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!("Refreshing");

            match self.tick().await {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(%e, "Refresh failed, keeping the previous snapshot"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{
        sink::tests::RecordingSink,
        test_utils::{FakeBroker, FakeCluster},
    };

    fn cluster() -> FakeCluster {
        FakeCluster::new("a:9092")
            .broker(FakeBroker::new("a:9092").with_group("g1", &[&["orders"]]))
            .topic("orders", &[(0, Some(10))])
            .committed("g1", "orders", &[(0, 4)])
    }

    fn monitor(cluster: FakeCluster) -> (Monitor<FakeCluster, RecordingSink>, Arc<SnapshotPublisher>) {
        let publisher = Arc::new(SnapshotPublisher::default());
        let monitor = Monitor::new(cluster, Arc::clone(&publisher), RefreshOptions::default());
        (monitor, publisher)
    }

    #[tokio::test]
    async fn test_tick_publishes_and_persists() {
        let (monitor, publisher) = monitor(cluster());
        let mut monitor = monitor.with_sink(RecordingSink::default());

        let snapshot = monitor.tick().await.unwrap();
        assert!(Arc::ptr_eq(&snapshot, &publisher.current().unwrap()));
        assert_eq!(snapshot.topic("orders").unwrap().subscribers[0].offset, 4);

        let sink = monitor.sink.as_ref().unwrap();
        assert_eq!(*sink.pings.lock(), 1);
        assert_eq!(sink.keys(), vec!["topic:orders", "subscriber:g1", "brokers"]);
    }

    #[tokio::test]
    async fn test_unreachable_sink_does_not_block_publishing() {
        let (monitor, publisher) = monitor(cluster());
        let mut monitor = monitor.with_sink(RecordingSink {
            down: true,
            reject: vec!["brokers".to_owned()],
            ..Default::default()
        });

        monitor.tick().await.unwrap();
        assert!(publisher.current().is_some());
        assert_eq!(monitor.sink.as_ref().unwrap().keys().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_snapshot() {
        let (mut monitor, publisher) = monitor(cluster());
        let first = monitor.tick().await.unwrap();

        monitor.cluster.set_fail_topics(true);
        let err = monitor.tick().await.unwrap_err();
        assert_matches!(err, RefreshError::Topics(_));
        assert!(Arc::ptr_eq(&first, &publisher.current().unwrap()));

        monitor.cluster.set_fail_topics(false);
        let third = monitor.tick().await.unwrap();
        assert!(Arc::ptr_eq(&third, &publisher.current().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_fatal_error() {
        let (mut monitor, publisher) = monitor(FakeCluster::without_controller());

        let err = monitor.run(Duration::from_secs(15)).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(publisher.current().is_none());
    }
}
