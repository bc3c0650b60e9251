use std::sync::Arc;

use kfk_monitor::{
    client::ClientBuilder,
    monitor::Monitor,
    pipeline::{OFFSETS_TOPIC, RefreshOptions},
    publisher::SnapshotPublisher,
    sink::MongoSink,
};

mod test_helpers;
use test_helpers::{TEST_TIMEOUT, maybe_start_logging};

#[tokio::test]
async fn test_tick() {
    maybe_start_logging();
    let cfg = maybe_skip_kafka_integration!();

    let client = ClientBuilder::new(cfg.bootstrap_brokers)
        .request_timeout(TEST_TIMEOUT)
        .build()
        .await
        .unwrap();
    let publisher = Arc::new(SnapshotPublisher::default());
    let mut monitor = Monitor::<_, MongoSink>::new(
        client,
        Arc::clone(&publisher),
        RefreshOptions {
            fetch_concurrency: 4,
        },
    );

    let snapshot = monitor.tick().await.unwrap();
    assert!(Arc::ptr_eq(&snapshot, &publisher.current().unwrap()));
    snapshot.check_invariants().unwrap();

    let brokers = snapshot.brokers();
    assert!(brokers.members.contains(&brokers.controller));

    assert!(snapshot.topic(OFFSETS_TOPIC).is_none());
    for topic in snapshot.topics().iter() {
        assert_eq!(topic.partitions.len(), topic.available_offsets.len());
        assert_eq!(topic.logsize, topic.available_offsets.iter().sum::<i64>());
    }
}
