use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc},
};
use thiserror::Error;
use tracing::info;

use super::SnapshotSink;
use crate::snapshot::{Brokers, Subscriber, Topic};

const TOPICS: &str = "topics";
const SUBSCRIBERS: &str = "subscribers";
const BROKERS: &str = "brokers";

/// `_id` of the single membership record.
const BROKERS_ID: i32 = 1;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Cannot encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// [`SnapshotSink`] backed by MongoDB.
#[derive(Debug, Clone)]
pub struct MongoSink {
    database: Database,
}

impl MongoSink {
    /// Parses `uri` and sets up the connection pool.
    ///
    /// The driver connects lazily, an unreachable server only shows up on the first operation.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, SinkError> {
        let client = Client::with_uri_str(uri).await?;
        info!(database, "MongoDB client ready");
        Ok(Self {
            database: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

fn topic_document(topic: &Topic, timestamp: DateTime<Utc>) -> Result<Document, SinkError> {
    let mut document = mongodb::bson::to_document(topic)?;
    document.insert("timestamp", timestamp.timestamp());
    Ok(document)
}

fn subscriber_document(subscriber: &Subscriber, timestamp: DateTime<Utc>) -> Document {
    doc! {
        "timestamp": timestamp.timestamp(),
        "group_id": subscriber.group_id.as_str(),
        "topics": subscriber.topics.clone(),
    }
}

fn brokers_document(brokers: &Brokers, timestamp: DateTime<Utc>) -> Document {
    doc! {
        "_id": BROKERS_ID,
        "timestamp": timestamp.timestamp(),
        "members": brokers.members.clone(),
        "controller": brokers.controller.as_str(),
    }
}

#[async_trait]
impl SnapshotSink for MongoSink {
    type Error = SinkError;

    async fn ping(&self) -> Result<(), SinkError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_topic(&self, topic: &Topic, timestamp: DateTime<Utc>) -> Result<(), SinkError> {
        self.collection(TOPICS)
            .insert_one(topic_document(topic, timestamp)?)
            .await?;
        Ok(())
    }

    async fn upsert_subscriber(
        &self,
        subscriber: &Subscriber,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        self.collection(SUBSCRIBERS)
            .replace_one(
                doc! { "group_id": subscriber.group_id.as_str() },
                subscriber_document(subscriber, timestamp),
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn upsert_brokers(&self, brokers: &Brokers, timestamp: DateTime<Utc>) -> Result<(), SinkError> {
        self.collection(BROKERS)
            .replace_one(doc! { "_id": BROKERS_ID }, brokers_document(brokers, timestamp))
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mongodb::bson::Bson;

    use super::*;
    use crate::snapshot::SnapshotBuilder;

    fn timestamp() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_topic_document() {
        let mut builder = SnapshotBuilder::new(timestamp());
        let idx = builder.topics.add_topic("orders", vec![0, 1]).unwrap();
        builder.topics.push_available_offset(idx, 3);
        builder.topics.push_available_offset(idx, 4);
        builder.record_subscription("orders", "g1");
        let snapshot = builder.summarize();

        let document = topic_document(snapshot.topic("orders").unwrap(), timestamp()).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "orders");
        assert_eq!(document.get_i64("timestamp").unwrap(), 1_700_000_000);
        assert_eq!(document.get_i64("logsize").unwrap(), 7);

        let subscribers = document.get_array("subscribers").unwrap();
        let Bson::Document(g1) = &subscribers[0] else {
            panic!("subscriber is not a document: {subscribers:?}");
        };
        assert_eq!(g1.get_str("group_id").unwrap(), "g1");
        assert_eq!(g1.get_str("offset_state").unwrap(), "unknown");
    }

    #[test]
    fn test_subscriber_document() {
        let subscriber = Subscriber {
            group_id: "g1".to_owned(),
            topics: vec!["orders".to_owned()],
        };
        let document = subscriber_document(&subscriber, timestamp());
        assert_eq!(document.get_str("group_id").unwrap(), "g1");
        assert_eq!(
            document.get_array("topics").unwrap(),
            &vec![Bson::String("orders".to_owned())]
        );
    }

    #[test]
    fn test_brokers_document_is_singleton() {
        let brokers = Brokers {
            members: vec!["a:9092".to_owned(), "b:9092".to_owned()],
            controller: "b:9092".to_owned(),
        };
        let document = brokers_document(&brokers, timestamp());
        assert_eq!(document.get_i32("_id").unwrap(), BROKERS_ID);
        assert_eq!(document.get_str("controller").unwrap(), "b:9092");
        assert_eq!(document.get_array("members").unwrap().len(), 2);
    }
}
