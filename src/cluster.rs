//! Capabilities the refresh pipeline needs from a cluster.
//!
//! [`Client`](crate::client::Client) implements these on top of the wire protocol. Tests implement them in memory.

use async_trait::async_trait;

use crate::{
    ProtocolError,
    protocol::{consumer::MemberSubscription, traits::ReadError},
};

/// Cluster-wide queries.
#[async_trait]
pub trait Cluster: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Broker: Broker;
    type OffsetManager: OffsetFetcher;

    /// One handle per broker that is currently a cluster member.
    async fn brokers(&self) -> Result<Vec<Self::Broker>, Self::Error>;

    /// Address of the controller broker.
    async fn controller(&self) -> Result<String, Self::Error>;

    /// Names of all topics, internal ones included.
    async fn topics(&self) -> Result<Vec<String>, Self::Error>;

    /// Partition IDs of `topic`, ascending.
    async fn partitions(&self, topic: &str) -> Result<Vec<i32>, Self::Error>;

    /// High-water mark of a partition.
    async fn latest_offset(&self, topic: &str, partition: i32) -> Result<i64, Self::Error>;

    /// Offset manager of `group`, bound to the group's coordinator.
    async fn offset_manager(&self, group: &str) -> Result<Self::OffsetManager, Self::Error>;
}

/// Queries that must be sent to one specific broker.
///
/// Group listing and description only cover the groups the receiving broker coordinates, so a complete picture needs
/// every broker to be asked.
#[async_trait]
pub trait Broker: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `host:port`, the identity of the broker.
    fn addr(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// (Re)connects, replacing any previous connection.
    async fn open(&self) -> Result<(), Self::Error>;

    /// IDs of the groups coordinated by this broker.
    async fn list_groups(&self) -> Result<Vec<String>, Self::Error>;

    async fn describe_groups(
        &self,
        groups: &[String],
    ) -> Result<Vec<GroupDescription>, Self::Error>;
}

/// Committed offsets of one consumer group.
#[async_trait]
pub trait OffsetFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Next offset the group will consume from a partition, `-1` if the group never committed one.
    async fn next_offset(&self, topic: &str, partition: i32) -> Result<i64, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescription {
    pub group_id: String,

    /// Group-level error reported by the coordinator.
    pub error: Option<ProtocolError>,

    pub state: String,
    pub protocol_type: String,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub member_id: String,
    pub client_id: String,
    pub client_host: String,

    /// Raw join-group metadata.
    pub metadata: Vec<u8>,
}

impl GroupMember {
    /// Topics this member declared when joining the group.
    pub fn subscription(&self) -> Result<MemberSubscription, ReadError> {
        MemberSubscription::decode(&self.metadata)
    }
}
