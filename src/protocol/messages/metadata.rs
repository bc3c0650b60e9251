use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug)]
pub struct MetadataRequest {
    /// The topics to fetch metadata for
    ///
    /// Requests data for all topics if None. An empty list requests no topics at all, which is a cheap way to learn
    /// the brokers and the controller.
    pub topics: Option<Vec<String>>,
}

impl RequestBody for MetadataRequest {
    type ResponseBody = MetadataResponse;

    const API_KEY: ApiKey = ApiKey::Metadata;

    /// Version 1 is the first one carrying the controller ID.
    const API_VERSION: i16 = 1;
}

impl<W> WriteType<W> for MetadataRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match &self.topics {
            Some(topics) => topics.write(writer),
            None => (-1i32).write(writer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    /// Each broker in the response
    pub brokers: Vec<MetadataResponseBroker>,

    /// The ID of the controller broker, `-1` if unknown.
    pub controller_id: i32,

    /// Each topic in the response
    pub topics: Vec<MetadataResponseTopic>,
}

impl<R> ReadType<R> for MetadataResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            brokers: ReadType::read(reader)?,
            controller_id: i32::read(reader)?,
            topics: ReadType::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponseBroker {
    /// The broker ID
    pub node_id: i32,

    /// The broker hostname
    pub host: String,

    /// The broker port
    pub port: i32,

    /// The rack of the broker
    pub rack: Option<String>,
}

impl<R> ReadType<R> for MetadataResponseBroker
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            node_id: i32::read(reader)?,
            host: String::read(reader)?,
            port: i32::read(reader)?,
            rack: ReadType::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponseTopic {
    /// The topic error if any
    pub error: Option<Error>,

    /// The topic name
    pub name: String,

    /// True if the topic is internal
    pub is_internal: bool,

    /// Each partition in the topic
    pub partitions: Vec<MetadataResponsePartition>,
}

impl<R> ReadType<R> for MetadataResponseTopic
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            error: Error::new(i16::read(reader)?),
            name: String::read(reader)?,
            is_internal: bool::read(reader)?,
            partitions: ReadType::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponsePartition {
    /// The partition error if any
    pub error: Option<Error>,

    /// The partition index
    pub partition_index: i32,

    /// The ID of the leader broker
    pub leader_id: i32,

    /// The set of all nodes that host this partition
    pub replica_nodes: Vec<i32>,

    /// The set of all nodes that are in sync with the leader for this partition
    pub isr_nodes: Vec<i32>,
}

impl<R> ReadType<R> for MetadataResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            error: Error::new(i16::read(reader)?),
            partition_index: i32::read(reader)?,
            leader_id: i32::read(reader)?,
            replica_nodes: ReadType::read(reader)?,
            isr_nodes: ReadType::read(reader)?,
        })
    }
}
