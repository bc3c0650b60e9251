//! Topic registry.

use serde::Serialize;

use super::{
    DuplicateTopic,
    indexed::{IndexedList, Keyed},
};

/// Whether a consumed count is backed by at least one committed offset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetState {
    Known,
    #[default]
    Unknown,
}

/// A consumer group as seen from one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSubscriber {
    pub group_id: String,

    /// Next offset per partition, in partition-iteration order. `-1` marks an unknown offset.
    ///
    /// Partitions whose offset manager could not be set up have no entry at all, so positions only line up with
    /// [`Topic::partitions`] when every lookup succeeded.
    pub next_offsets: Vec<i64>,

    /// Sum of the known next offsets.
    pub offset: i64,

    pub offset_state: OffsetState,
}

impl TopicSubscriber {
    fn new(group_id: String) -> Self {
        Self {
            group_id,
            next_offsets: vec![],
            offset: 0,
            offset_state: OffsetState::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub name: String,
    pub partitions: Vec<i32>,
    pub subscribers: Vec<TopicSubscriber>,

    /// High-water mark per partition, aligned with `partitions`.
    pub available_offsets: Vec<i64>,

    /// Sum of `available_offsets`.
    pub logsize: i64,
}

impl Topic {
    pub fn subscriber(&self, group_id: &str) -> Option<&TopicSubscriber> {
        self.subscribers.iter().find(|s| s.group_id == group_id)
    }
}

impl Keyed for Topic {
    fn key(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopicRegistry {
    topics: IndexedList<Topic>,
}

impl TopicRegistry {
    /// Registers a topic and returns its position.
    ///
    /// The first registration of a name wins, later ones are rejected.
    pub fn add_topic(
        &mut self,
        name: impl Into<String>,
        partitions: Vec<i32>,
    ) -> Result<usize, DuplicateTopic> {
        let name = name.into();
        self.topics
            .insert(Topic {
                name: name.clone(),
                partitions,
                subscribers: vec![],
                available_offsets: vec![],
                logsize: 0,
            })
            .map_err(|_| DuplicateTopic(name))
    }

    /// Adds `group_id` as subscriber of `topic`.
    ///
    /// Returns `false` if the topic is unknown. Adding a known subscriber again is a no-op.
    pub fn add_subscriber(&mut self, topic: &str, group_id: &str) -> bool {
        let Some(topic) = self.topics.get_mut(topic) else {
            return false;
        };

        if topic.subscriber(group_id).is_none() {
            topic
                .subscribers
                .push(TopicSubscriber::new(group_id.to_owned()));
        }
        true
    }

    /// Appends the high-water mark of the next partition of the topic at `index`.
    pub fn push_available_offset(&mut self, index: usize, offset: i64) {
        if let Some(topic) = self.topics.at_mut(index) {
            topic.available_offsets.push(offset);
        }
    }

    /// Appends a next offset for `group_id` on the topic at `index`.
    ///
    /// Groups that are not subscribers of the topic are ignored.
    pub fn add_next_offset(&mut self, index: usize, group_id: &str, offset: i64) {
        let subscriber = self
            .topics
            .at_mut(index)
            .and_then(|t| t.subscribers.iter_mut().find(|s| s.group_id == group_id));
        if let Some(subscriber) = subscriber {
            subscriber.next_offsets.push(offset);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    pub fn at(&self, index: usize) -> Option<&Topic> {
        self.topics.at(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.topics.contains(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Topic> {
        self.topics.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Topic> {
        self.topics.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        self.topics.check_invariants()?;
        for topic in &self.topics {
            for (i, s) in topic.subscribers.iter().enumerate() {
                if topic.subscribers[..i].iter().any(|o| o.group_id == s.group_id) {
                    return Err(format!(
                        "group {:?} subscribed twice to {:?}",
                        s.group_id, topic.name
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_duplicate_topic_first_wins() {
        let mut topics = TopicRegistry::default();
        assert_eq!(topics.add_topic("orders", vec![0, 1, 2]), Ok(0));
        assert_matches!(
            topics.add_topic("orders", vec![0]),
            Err(DuplicateTopic(name)) if name == "orders"
        );
        assert_eq!(topics.get("orders").unwrap().partitions, vec![0, 1, 2]);
        assert_eq!(topics.len(), 1);
    }

    #[test]
    fn test_add_subscriber() {
        let mut topics = TopicRegistry::default();
        topics.add_topic("orders", vec![0]).unwrap();

        assert!(topics.add_subscriber("orders", "g1"));
        assert!(topics.add_subscriber("orders", "g1"));
        assert!(topics.add_subscriber("orders", "g2"));
        assert!(!topics.add_subscriber("payments", "g1"));

        let groups: Vec<_> = topics
            .get("orders")
            .unwrap()
            .subscribers
            .iter()
            .map(|s| s.group_id.as_str())
            .collect();
        assert_eq!(groups, vec!["g1", "g2"]);
    }

    #[test]
    fn test_add_next_offset() {
        let mut topics = TopicRegistry::default();
        let idx = topics.add_topic("orders", vec![0, 1]).unwrap();
        topics.add_subscriber("orders", "g1");

        topics.add_next_offset(idx, "g1", 80);
        topics.add_next_offset(idx, "g1", -1);
        // not a subscriber
        topics.add_next_offset(idx, "g2", 5);
        // not a topic
        topics.add_next_offset(7, "g1", 5);

        let topic = topics.at(idx).unwrap();
        assert_eq!(topic.subscriber("g1").unwrap().next_offsets, vec![80, -1]);
        assert!(topic.subscriber("g2").is_none());
    }

    #[test]
    fn test_push_available_offset() {
        let mut topics = TopicRegistry::default();
        let idx = topics.add_topic("orders", vec![0, 1]).unwrap();
        assert!(topics.at(idx).unwrap().available_offsets.is_empty());

        topics.push_available_offset(idx, 100);
        topics.push_available_offset(idx, 50);
        assert_eq!(topics.at(idx).unwrap().available_offsets, vec![100, 50]);
    }

    proptest! {
        #[test]
        fn subscribers_stay_unique(
            pairs in proptest::collection::vec(("[a-c]", "g[0-3]"), 0..64),
        ) {
            let mut topics = TopicRegistry::default();
            for t in ["a", "b"] {
                topics.add_topic(t, vec![0]).unwrap();
            }

            for (topic, group) in &pairs {
                let known = topics.add_subscriber(topic, group);
                prop_assert_eq!(known, topic != "c");
            }

            prop_assert!(topics.check_invariants().is_ok());
            for (topic, group) in &pairs {
                if let Some(t) = topics.get(topic) {
                    prop_assert!(t.subscriber(group).is_some());
                }
            }
        }
    }
}
