use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    cluster::Cluster,
    connection::{self, BrokerConnection, BrokerTopology, ConnectionConfig},
    protocol::{
        error::Error as ProtocolError,
        messages::{
            FindCoordinatorRequest, ListOffsetsRequest, MetadataRequest, MetadataResponse,
            MetadataResponseTopic,
        },
    },
};

pub mod broker;
pub mod error;
mod metadata_cache;
pub mod offset_manager;

use self::{broker::BrokerClient, metadata_cache::MetadataCache, offset_manager::OffsetManager};
use error::{Error, Result};

/// Client ID sent with every request unless configured otherwise.
pub const DEFAULT_CLIENT_ID: &str = "kfk-monitor";

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    bootstrap_brokers: Vec<String>,
    config: ConnectionConfig,
}

impl ClientBuilder {
    /// Create a new [`ClientBuilder`] with the list of bootstrap brokers
    pub fn new(bootstrap_brokers: Vec<String>) -> Self {
        Self {
            bootstrap_brokers,
            config: ConnectionConfig::default(),
        }
    }

    pub fn client_id(mut self, client_id: impl Into<Arc<str>>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// Upper bound for establishing a TCP connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Upper bound for a single request/response exchange.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Largest response frame accepted from a broker.
    pub fn max_message_size(mut self, max_message_size: usize) -> Self {
        self.config.max_message_size = max_message_size;
        self
    }

    /// Build [`Client`].
    ///
    /// Fails unless one of the bootstrap brokers can be reached and answers a metadata request.
    pub async fn build(self) -> Result<Client> {
        let client = Client {
            bootstrap_brokers: self.bootstrap_brokers,
            config: self.config,
            topology: BrokerTopology::default(),
            metadata_cache: MetadataCache::default(),
            connections: Mutex::new(BTreeMap::new()),
        };
        let metadata = client.refresh_metadata().await?;
        info!(
            brokers = metadata.brokers.len(),
            topics = metadata.topics.len(),
            "Connected to cluster"
        );

        Ok(client)
    }
}

/// Cluster client speaking the Kafka wire protocol.
///
/// Connections are shared by address: the partition leaders, group coordinators and the broker answering metadata
/// requests are often the same machines.
#[derive(Debug)]
pub struct Client {
    bootstrap_brokers: Vec<String>,
    config: ConnectionConfig,
    topology: BrokerTopology,
    metadata_cache: MetadataCache,
    connections: Mutex<BTreeMap<String, BrokerConnection>>,
}

impl Client {
    /// Fetches metadata for all topics and caches it.
    pub async fn refresh_metadata(&self) -> Result<MetadataResponse> {
        let metadata = self.request_metadata(None).await?;
        self.metadata_cache.update(metadata.clone());
        Ok(metadata)
    }

    async fn request_metadata(&self, topics: Option<Vec<String>>) -> Result<MetadataResponse> {
        let conn = self.arbitrary_broker().await?;
        let metadata = conn.request(&MetadataRequest { topics }).await?;
        self.topology.update(&metadata.brokers);
        Ok(metadata)
    }

    /// Membership and controller only, without topic data.
    async fn request_cluster_metadata(&self) -> Result<MetadataResponse> {
        self.request_metadata(Some(vec![])).await
    }

    async fn connect_url(&self, url: &str) -> Result<BrokerConnection> {
        let existing = self
            .connections
            .lock()
            .get(url)
            .filter(|c| !c.is_poisoned())
            .map(Arc::clone);
        if let Some(conn) = existing {
            return Ok(conn);
        }

        let conn = connection::connect(url, &self.config).await?;
        self.connections
            .lock()
            .insert(url.to_owned(), Arc::clone(&conn));
        Ok(conn)
    }

    /// Any reachable broker, known cluster members first, then the bootstrap list.
    async fn arbitrary_broker(&self) -> Result<BrokerConnection> {
        let mut urls = self.topology.get_broker_urls();
        for url in &self.bootstrap_brokers {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }

        let mut last_error = Error::NoBrokers;
        for url in urls {
            match self.connect_url(&url).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!(%e, broker = %url, "Failed to connect to broker");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn topic_metadata(&self, topic: &str) -> Result<MetadataResponseTopic> {
        if let Some(t) = self.metadata_cache.topic(topic) {
            return Ok(t);
        }

        self.request_metadata(Some(vec![topic.to_owned()]))
            .await?
            .topics
            .into_iter()
            .find(|t| t.name == topic)
            .ok_or_else(|| Error::server(ProtocolError::UnknownTopicOrPartition, topic))
    }

    async fn leader(&self, topic: &str, partition: i32) -> Result<BrokerConnection> {
        let metadata = self.topic_metadata(topic).await?;
        let p = metadata
            .partitions
            .iter()
            .find(|p| p.partition_index == partition)
            .ok_or_else(|| {
                Error::server(
                    ProtocolError::UnknownTopicOrPartition,
                    format!("{topic}/{partition}"),
                )
            })?;

        if p.leader_id < 0 {
            self.metadata_cache.invalidate();
            return Err(Error::server(
                ProtocolError::LeaderNotAvailable,
                format!("{topic}/{partition}"),
            ));
        }

        debug!(topic, partition, leader = p.leader_id, "Found partition leader");
        let url = self
            .topology
            .get_broker_url(p.leader_id)
            .ok_or(Error::UnknownBroker(p.leader_id))?;
        self.connect_url(&url).await
    }
}

#[async_trait]
impl Cluster for Client {
    type Error = Error;
    type Broker = BrokerClient;
    type OffsetManager = OffsetManager;

    async fn brokers(&self) -> Result<Vec<BrokerClient>> {
        self.request_cluster_metadata().await?;
        Ok(self
            .topology
            .get_broker_urls()
            .into_iter()
            .map(|url| BrokerClient::new(url, self.config.clone()))
            .collect())
    }

    async fn controller(&self) -> Result<String> {
        let metadata = self.request_cluster_metadata().await?;
        if metadata.controller_id < 0 {
            return Err(Error::InvalidResponse(
                "Metadata response carries no controller".to_owned(),
            ));
        }

        self.topology
            .get_broker_url(metadata.controller_id)
            .ok_or(Error::UnknownBroker(metadata.controller_id))
    }

    async fn topics(&self) -> Result<Vec<String>> {
        let metadata = self.refresh_metadata().await?;
        Ok(metadata.topics.into_iter().map(|t| t.name).collect())
    }

    async fn partitions(&self, topic: &str) -> Result<Vec<i32>> {
        let metadata = self.topic_metadata(topic).await?;
        if let Some(e) = metadata.error {
            return Err(Error::server(e, topic));
        }

        let mut partitions: Vec<i32> = metadata
            .partitions
            .iter()
            .map(|p| p.partition_index)
            .collect();
        partitions.sort_unstable();
        Ok(partitions)
    }

    async fn latest_offset(&self, topic: &str, partition: i32) -> Result<i64> {
        let leader = self.leader(topic, partition).await?;
        let response = leader
            .request(&ListOffsetsRequest::latest(topic, partition))
            .await?;

        let p = response
            .topics
            .into_iter()
            .filter(|t| t.name == topic)
            .flat_map(|t| t.partitions)
            .find(|p| p.partition_index == partition)
            .ok_or_else(|| {
                Error::InvalidResponse(format!(
                    "No offset for partition {partition} in topic \"{topic}\""
                ))
            })?;

        if let Some(e) = p.error {
            if matches!(
                e,
                ProtocolError::NotLeaderOrFollower | ProtocolError::UnknownTopicOrPartition
            ) {
                // leadership moved, the next lookup has to see fresh metadata
                self.metadata_cache.invalidate();
            }
            return Err(Error::server(e, format!("{topic}/{partition}")));
        }

        Ok(p.offset)
    }

    async fn offset_manager(&self, group: &str) -> Result<OffsetManager> {
        let conn = self.arbitrary_broker().await?;
        let response = conn
            .request(&FindCoordinatorRequest {
                key: group.to_owned(),
            })
            .await?;
        if let Some(e) = response.error {
            return Err(Error::server(e, format!("find coordinator for \"{group}\"")));
        }

        let url = format!("{}:{}", response.host, response.port);
        debug!(group, coordinator = %url, "Found group coordinator");
        let coordinator = self.connect_url(&url).await?;
        Ok(OffsetManager::new(group.to_owned(), coordinator))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn test_build_without_reachable_broker() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = ClientBuilder::new(vec![addr])
            .connect_timeout(Duration::from_millis(500))
            .build()
            .await
            .unwrap_err();
        assert_matches!(err, Error::Connection(_));
    }

    #[tokio::test]
    async fn test_build_without_bootstrap_brokers() {
        let err = ClientBuilder::new(vec![]).build().await.unwrap_err();
        assert_matches!(err, Error::NoBrokers);
    }
}
