//! Persistence of published snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::snapshot::{Brokers, Snapshot, Subscriber, Topic};

mod mongo;

pub use mongo::{MongoSink, SinkError};

/// Durable storage for snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Checks that the storage is reachable.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Appends one record per topic and cycle.
    async fn insert_topic(&self, topic: &Topic, timestamp: DateTime<Utc>) -> Result<(), Self::Error>;

    /// Replaces the record of the subscriber's group.
    async fn upsert_subscriber(
        &self,
        subscriber: &Subscriber,
        timestamp: DateTime<Utc>,
    ) -> Result<(), Self::Error>;

    /// Replaces the single membership record.
    async fn upsert_brokers(&self, brokers: &Brokers, timestamp: DateTime<Utc>) -> Result<(), Self::Error>;
}

/// Writes every record of `snapshot`, returns how many writes failed.
///
/// A failed write is logged and does not stop the remaining ones.
pub async fn persist<S>(sink: &S, snapshot: &Snapshot) -> usize
where
    S: SnapshotSink,
{
    let timestamp = snapshot.taken_at();
    let mut failed = 0;

    for topic in snapshot.topics().iter() {
        if let Err(e) = sink.insert_topic(topic, timestamp).await {
            warn!(%e, topic = %topic.name, "Cannot save topic");
            failed += 1;
        }
    }

    for subscriber in snapshot.subscribers().iter() {
        if let Err(e) = sink.upsert_subscriber(subscriber, timestamp).await {
            warn!(%e, group = %subscriber.group_id, "Cannot save subscriber");
            failed += 1;
        }
    }

    if let Err(e) = sink.upsert_brokers(snapshot.brokers(), timestamp).await {
        warn!(%e, "Cannot save brokers");
        failed += 1;
    }

    debug!(failed, "Snapshot persisted");
    failed
}
