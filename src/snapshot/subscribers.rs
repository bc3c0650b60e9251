//! Subscriber registry.

use serde::Serialize;

use super::indexed::{IndexedList, Keyed};

/// A consumer group and the topics its members subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub group_id: String,
    pub topics: Vec<String>,
}

impl Keyed for Subscriber {
    fn key(&self) -> &str {
        &self.group_id
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubscriberRegistry {
    subscribers: IndexedList<Subscriber>,
}

impl SubscriberRegistry {
    /// Records that `group_id` consumes `topic`.
    ///
    /// Returns `true` if the pair was not known before.
    pub fn add_subscription(&mut self, group_id: &str, topic: &str) -> bool {
        if let Some(subscriber) = self.subscribers.get_mut(group_id) {
            if subscriber.topics.iter().any(|t| t == topic) {
                return false;
            }
            subscriber.topics.push(topic.to_owned());
            return true;
        }

        // a miss on the lookup above guarantees the insert succeeds
        let _ = self.subscribers.insert(Subscriber {
            group_id: group_id.to_owned(),
            topics: vec![topic.to_owned()],
        });
        true
    }

    pub fn get(&self, group_id: &str) -> Option<&Subscriber> {
        self.subscribers.get(group_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subscriber> {
        self.subscribers.iter()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        self.subscribers.check_invariants()?;
        for s in &self.subscribers {
            for (i, t) in s.topics.iter().enumerate() {
                if s.topics[..i].contains(t) {
                    return Err(format!("group {:?} lists {t:?} twice", s.group_id));
                }
            }
        }
        Ok(())
    }
}
