use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::{Display, Formatter};

use parking_lot::RwLock;
use tracing::info;

use crate::protocol::messages::MetadataResponseBroker;

/// Broker ID to address mapping, kept current from every metadata response.
#[derive(Debug, Default)]
pub struct BrokerTopology {
    topology: RwLock<BTreeMap<i32, Broker>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Broker {
    host: String,
    port: i32,
}

impl Display for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'a> From<&'a MetadataResponseBroker> for Broker {
    fn from(b: &'a MetadataResponseBroker) -> Self {
        Self {
            host: b.host.clone(),
            port: b.port,
        }
    }
}

impl BrokerTopology {
    pub fn is_empty(&self) -> bool {
        self.topology.read().is_empty()
    }

    /// Returns the broker URL for the provided broker
    pub fn get_broker_url(&self, broker_id: i32) -> Option<String> {
        self.topology
            .read()
            .get(&broker_id)
            .map(ToString::to_string)
    }

    /// Returns the URLs of all known brokers, ordered by broker ID
    pub fn get_broker_urls(&self) -> Vec<String> {
        self.topology
            .read()
            .values()
            .map(ToString::to_string)
            .collect()
    }

    /// Updates with the provided broker metadata
    ///
    /// Brokers missing from `brokers` are dropped, the metadata response always lists the complete membership.
    pub fn update(&self, brokers: &[MetadataResponseBroker]) {
        let mut topology = self.topology.write();
        topology.retain(|id, _| brokers.iter().any(|b| b.node_id == *id));

        for broker in brokers {
            match topology.entry(broker.node_id) {
                Entry::Occupied(mut o) => {
                    let current = o.get_mut();
                    let new = Broker::from(broker);
                    if *current != new {
                        info!(
                            broker = broker.node_id,
                            current = %current,
                            new = %new,
                            "Broker update",
                        );
                        *current = new;
                    }
                }
                Entry::Vacant(v) => {
                    let new = Broker::from(broker);
                    info!(broker = broker.node_id, new = %new, "New broker");
                    v.insert(new);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker(node_id: i32, host: &str) -> MetadataResponseBroker {
        MetadataResponseBroker {
            node_id,
            host: host.to_owned(),
            port: 9092,
            rack: None,
        }
    }

    #[test]
    fn test_update() {
        let topology = BrokerTopology::default();
        assert!(topology.is_empty());

        topology.update(&[broker(2, "b"), broker(1, "a")]);
        assert_eq!(topology.get_broker_urls(), vec!["a:9092", "b:9092"]);
        assert_eq!(topology.get_broker_url(2).as_deref(), Some("b:9092"));

        topology.update(&[broker(2, "c")]);
        assert_eq!(topology.get_broker_urls(), vec!["c:9092"]);
        assert_eq!(topology.get_broker_url(1), None);
    }
}
