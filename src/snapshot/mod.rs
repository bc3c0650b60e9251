//! Point-in-time view of the cluster.
//!
//! A [`SnapshotBuilder`] is filled by one refresh cycle and turned into an immutable [`Snapshot`] by
//! [`SnapshotBuilder::summarize`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub mod indexed;
pub mod subscribers;
pub mod summary;
pub mod topics;

pub use self::{
    subscribers::{Subscriber, SubscriberRegistry},
    topics::{OffsetState, Topic, TopicRegistry, TopicSubscriber},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Duplicate topic \"{0}\"")]
pub struct DuplicateTopic(pub String);

/// Cluster membership.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Brokers {
    /// Broker addresses, ordered.
    pub members: Vec<String>,

    /// Address of the controller.
    pub controller: String,
}

#[derive(Debug)]
pub struct SnapshotBuilder {
    taken_at: DateTime<Utc>,
    pub topics: TopicRegistry,
    pub subscribers: SubscriberRegistry,
    pub brokers: Brokers,
}

impl SnapshotBuilder {
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            topics: TopicRegistry::default(),
            subscribers: SubscriberRegistry::default(),
            brokers: Brokers::default(),
        }
    }

    /// Records that `group_id` consumes `topic` in both registries.
    ///
    /// Subscriptions to topics that are not part of the snapshot are dropped so the registries never disagree.
    pub fn record_subscription(&mut self, topic: &str, group_id: &str) -> bool {
        if !self.topics.add_subscriber(topic, group_id) {
            return false;
        }
        self.subscribers.add_subscription(group_id, topic);
        true
    }

    /// Derives the computed figures and freezes the snapshot.
    pub fn summarize(mut self) -> Snapshot {
        summary::summarize(&mut self.topics);
        Snapshot {
            taken_at: self.taken_at,
            topics: self.topics,
            subscribers: self.subscribers,
            brokers: self.brokers,
        }
    }
}

/// The outcome of one complete refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(rename = "timestamp", with = "chrono::serde::ts_seconds")]
    taken_at: DateTime<Utc>,
    topics: TopicRegistry,
    subscribers: SubscriberRegistry,
    brokers: Brokers,
}

impl Snapshot {
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn subscriber(&self, group_id: &str) -> Option<&Subscriber> {
        self.subscribers.get(group_id)
    }

    pub fn brokers(&self) -> &Brokers {
        &self.brokers
    }

    /// Checks that the registries are consistent with themselves and with each other.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.topics.check_invariants()?;
        self.subscribers.check_invariants()?;

        let mut from_topics = 0;
        for topic in self.topics.iter() {
            for s in &topic.subscribers {
                from_topics += 1;
                let listed = self
                    .subscribers
                    .get(&s.group_id)
                    .is_some_and(|sub| sub.topics.contains(&topic.name));
                if !listed {
                    return Err(format!(
                        "{:?} subscribes {:?} only in the topic registry",
                        s.group_id, topic.name
                    ));
                }
            }
        }

        let from_subscribers: usize = self.subscribers.iter().map(|s| s.topics.len()).sum();
        if from_topics != from_subscribers {
            return Err(format!(
                "topic registry holds {from_topics} subscriptions, subscriber registry {from_subscribers}"
            ));
        }

        Ok(())
    }
}
