//! Broker connection registry.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::cluster::Broker;

#[derive(Debug)]
struct Entry<B> {
    broker: B,
    alive: bool,
}

/// One broker handle per address, ordered by address.
///
/// Handles survive across refresh cycles so open connections are reused. The registry is owned by a single refresh
/// cycle at a time and needs no locking.
#[derive(Debug)]
pub struct BrokerRegistry<B> {
    brokers: BTreeMap<String, Entry<B>>,
}

impl<B> Default for BrokerRegistry<B> {
    fn default() -> Self {
        Self {
            brokers: BTreeMap::new(),
        }
    }
}

impl<B> BrokerRegistry<B>
where
    B: Broker,
{
    /// Replaces the membership with `brokers`.
    ///
    /// Brokers already known keep their existing handle, new ones are added unconnected and brokers that left the
    /// cluster are dropped.
    pub fn sync(&mut self, brokers: Vec<B>) {
        let mut next = BTreeMap::new();
        for broker in brokers {
            let addr = broker.addr().to_owned();
            let entry = match self.brokers.remove(&addr) {
                Some(existing) => existing,
                None => {
                    info!(broker = %addr, "Broker joined");
                    Entry {
                        broker,
                        alive: false,
                    }
                }
            };
            next.insert(addr, entry);
        }

        for addr in self.brokers.keys() {
            info!(broker = %addr, "Broker left");
        }
        self.brokers = next;
    }

    /// Makes sure the broker at `addr` has a usable connection.
    ///
    /// Returns `false` if the broker is unknown or cannot be reached, the caller should skip it for the rest of the
    /// cycle.
    pub async fn ensure_connected(&mut self, addr: &str) -> bool {
        let Some(entry) = self.brokers.get_mut(addr) else {
            return false;
        };

        if entry.broker.is_connected() {
            entry.alive = true;
            return true;
        }

        match entry.broker.open().await {
            Ok(()) => {
                entry.alive = true;
                true
            }
            Err(e) => {
                warn!(%e, broker = addr, "Failed to connect to broker");
                entry.alive = false;
                false
            }
        }
    }

    /// Connects every known broker, returns the addresses that are usable.
    pub async fn connect_all(&mut self) -> Vec<String> {
        let mut connected = Vec::with_capacity(self.brokers.len());
        for addr in self.addrs() {
            if self.ensure_connected(&addr).await {
                connected.push(addr);
            }
        }
        connected
    }

    pub fn addrs(&self) -> Vec<String> {
        self.brokers.keys().cloned().collect()
    }

    pub fn get(&self, addr: &str) -> Option<&B> {
        self.brokers.get(addr).map(|e| &e.broker)
    }

    /// Outcome of the last connection attempt.
    pub fn is_alive(&self, addr: &str) -> bool {
        self.brokers.get(addr).is_some_and(|e| e.alive)
    }

    pub fn len(&self) -> usize {
        self.brokers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }
}
