use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

/// Lists the groups coordinated by the broker that receives the request.
///
/// The request has no body at version 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListGroupsRequest;

impl<W> WriteType<W> for ListGroupsRequest
where
    W: Write,
{
    fn write(&self, _writer: &mut W) -> Result<(), WriteError> {
        Ok(())
    }
}

impl RequestBody for ListGroupsRequest {
    type ResponseBody = ListGroupsResponse;

    const API_KEY: ApiKey = ApiKey::ListGroups;

    const API_VERSION: i16 = 0;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedGroup {
    /// The group ID.
    pub group_id: String,

    /// The group protocol type, `consumer` for regular consumer groups.
    pub protocol_type: String,
}

impl<R> ReadType<R> for ListedGroup
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            group_id: String::read(reader)?,
            protocol_type: String::read(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListGroupsResponse {
    /// The error code, or 0 if there was no error.
    pub error: Option<Error>,

    /// Each group in the response.
    pub groups: Vec<ListedGroup>,
}

impl<R> ReadType<R> for ListGroupsResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            error: Error::new(i16::read(reader)?),
            groups: ReadType::read(reader)?,
        })
    }
}
