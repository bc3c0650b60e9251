use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

/// Timestamp asking for the offset of the next message to be written, i.e. the high-water mark.
pub const LATEST_TIMESTAMP: i64 = -1;

#[derive(Debug)]
pub struct ListOffsetsRequestPartition {
    /// The partition index.
    pub partition_index: i32,

    /// The current timestamp.
    ///
    /// `-1` requests the latest offset, `-2` the earliest one.
    pub timestamp: i64,
}

impl<W> WriteType<W> for ListOffsetsRequestPartition
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_index.write(writer)?;
        self.timestamp.write(writer)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ListOffsetsRequestTopic {
    /// The topic name.
    pub name: String,

    /// Each partition in the request.
    pub partitions: Vec<ListOffsetsRequestPartition>,
}

impl<W> WriteType<W> for ListOffsetsRequestTopic
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.name.write(writer)?;
        self.partitions.write(writer)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ListOffsetsRequest {
    /// The broker ID of the requestor, or -1 if this request is being made by a normal consumer.
    pub replica_id: i32,

    /// Each topic in the request.
    pub topics: Vec<ListOffsetsRequestTopic>,
}

impl ListOffsetsRequest {
    /// High-water mark of a single partition, as a normal consumer would ask for it.
    pub fn latest(topic: &str, partition: i32) -> Self {
        Self {
            replica_id: -1,
            topics: vec![ListOffsetsRequestTopic {
                name: topic.to_owned(),
                partitions: vec![ListOffsetsRequestPartition {
                    partition_index: partition,
                    timestamp: LATEST_TIMESTAMP,
                }],
            }],
        }
    }
}

impl<W> WriteType<W> for ListOffsetsRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.replica_id.write(writer)?;
        self.topics.write(writer)?;
        Ok(())
    }
}

impl RequestBody for ListOffsetsRequest {
    type ResponseBody = ListOffsetsResponse;

    const API_KEY: ApiKey = ApiKey::ListOffsets;

    /// Version 1 returns a single offset per partition instead of the legacy offset array.
    const API_VERSION: i16 = 1;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOffsetsResponsePartition {
    /// The partition index.
    pub partition_index: i32,

    /// The partition error code, or 0 if there was no error.
    pub error: Option<Error>,

    /// The timestamp associated with the returned offset.
    pub timestamp: i64,

    /// The returned offset.
    pub offset: i64,
}

impl<R> ReadType<R> for ListOffsetsResponsePartition
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error: Error::new(i16::read(reader)?),
            timestamp: i64::read(reader)?,
            offset: i64::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOffsetsResponseTopic {
    /// The topic name.
    pub name: String,

    /// Each partition in the response.
    pub partitions: Vec<ListOffsetsResponsePartition>,
}

impl<R> ReadType<R> for ListOffsetsResponseTopic
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
pub struct ListOffsetsResponse {
    /// Each topic in the response.
    pub topics: Vec<ListOffsetsResponseTopic>,
}

impl<R> ReadType<R> for ListOffsetsResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            topics: ReadType::read(reader)?,
        })
    }
}
