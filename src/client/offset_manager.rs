use async_trait::async_trait;

use super::error::{Error, Result};
use crate::{
    cluster::OffsetFetcher,
    connection::BrokerConnection,
    protocol::messages::{OffsetFetchRequest, OffsetFetchRequestTopic},
};

/// Reads the committed offsets of one consumer group from its coordinator.
#[derive(Debug)]
pub struct OffsetManager {
    group: String,
    coordinator: BrokerConnection,
}

impl OffsetManager {
    pub(crate) fn new(group: String, coordinator: BrokerConnection) -> Self {
        Self { group, coordinator }
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[async_trait]
impl OffsetFetcher for OffsetManager {
    type Error = Error;

    async fn next_offset(&self, topic: &str, partition: i32) -> Result<i64> {
        let request = OffsetFetchRequest {
            group_id: self.group.clone(),
            topics: vec![OffsetFetchRequestTopic {
                name: topic.to_owned(),
                partition_indexes: vec![partition],
            }],
        };
        let response = self.coordinator.request(&request).await?;

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
            return Err(Error::server(
                e,
                format!("fetch offset of group \"{}\" for {topic}/{partition}", self.group),
            ));
        }

        Ok(p.committed_offset)
    }
}
