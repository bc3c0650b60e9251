use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    primitives::Bytes,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug)]
pub struct DescribeGroupsRequest {
    /// The names of the groups to describe.
    pub groups: Vec<String>,
}

impl<W> WriteType<W> for DescribeGroupsRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.groups.write(writer)
    }
}

impl RequestBody for DescribeGroupsRequest {
    type ResponseBody = DescribeGroupsResponse;

    const API_KEY: ApiKey = ApiKey::DescribeGroups;

    const API_VERSION: i16 = 0;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedGroupMember {
    /// The member ID assigned by the group coordinator.
    pub member_id: String,

    /// The client ID used in the member's latest join group request.
    pub client_id: String,

    /// The client host.
    pub client_host: String,

    /// The metadata corresponding to the current group protocol in use.
    ///
    /// For `consumer` groups this is a `ConsumerProtocolSubscription`, see
    /// [`MemberSubscription`](crate::protocol::consumer::MemberSubscription).
    pub member_metadata: Bytes,

    /// The current assignment provided by the group leader.
    pub member_assignment: Bytes,
}

impl<R> ReadType<R> for DescribedGroupMember
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            member_id: String::read(reader)?,
            client_id: String::read(reader)?,
            client_host: String::read(reader)?,
            member_metadata: Bytes::read(reader)?,
            member_assignment: Bytes::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedGroup {
    /// The describe error, or None if there was no error.
    pub error: Option<Error>,

    /// The group ID string.
    pub group_id: String,

    /// The group state string, or the empty string.
    pub group_state: String,

    /// The group protocol type, or the empty string.
    pub protocol_type: String,

    /// The group protocol data, or the empty string.
    pub protocol_data: String,

    /// The group members.
    pub members: Vec<DescribedGroupMember>,
}

impl<R> ReadType<R> for DescribedGroup
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            error: Error::new(i16::read(reader)?),
            group_id: String::read(reader)?,
            group_state: String::read(reader)?,
            protocol_type: String::read(reader)?,
            protocol_data: String::read(reader)?,
            members: ReadType::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeGroupsResponse {
    /// Each described group.
    pub groups: Vec<DescribedGroup>,
}

impl<R> ReadType<R> for DescribeGroupsResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            groups: ReadType::read(reader)?,
        })
    }
}
