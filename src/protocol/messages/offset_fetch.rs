use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug)]
pub struct OffsetFetchRequestTopic {
    /// The topic name.
    pub name: String,

    /// The partition indexes we would like to fetch offsets for.
    pub partition_indexes: Vec<i32>,
}

impl<W> WriteType<W> for OffsetFetchRequestTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.name.write(writer)?;
        self.partition_indexes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct OffsetFetchRequest {
    /// The group to fetch offsets for.
    pub group_id: String,

    /// Each topic we would like to fetch offsets for.
    pub topics: Vec<OffsetFetchRequestTopic>,
}

impl<W> WriteType<W> for OffsetFetchRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.group_id.write(writer)?;
        self.topics.write(writer)?;
        Ok(())
    }
}

impl RequestBody for OffsetFetchRequest {
    type ResponseBody = OffsetFetchResponse;

    const API_KEY: ApiKey = ApiKey::OffsetFetch;

    /// Version 1 reads offsets committed to Kafka rather than ZooKeeper.
    const API_VERSION: i16 = 1;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchResponsePartition {
    /// The partition index.
    pub partition_index: i32,

    /// The committed message offset, `-1` if nothing was committed.
    pub committed_offset: i64,

    /// The partition metadata.
    pub metadata: Option<String>,

    /// The error code, or 0 if there was no error.
    pub error: Option<Error>,
}

impl<R> ReadType<R> for OffsetFetchResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            committed_offset: i64::read(reader)?,
            metadata: ReadType::read(reader)?,
            error: Error::new(i16::read(reader)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchResponseTopic {
    /// The topic name.
    pub name: String,

    /// The responses per partition.
    pub partitions: Vec<OffsetFetchResponsePartition>,
}

impl<R> ReadType<R> for OffsetFetchResponseTopic
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: ReadType::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchResponse {
    /// The responses per topic.
    pub topics: Vec<OffsetFetchResponseTopic>,
}

impl<R> ReadType<R> for OffsetFetchResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            topics: ReadType::read(reader)?,
        })
    }
}
