use std::io::{Read, Write};

use super::RequestBody;
use crate::protocol::{
    api_key::ApiKey,
    error::Error,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

#[derive(Debug)]
pub struct FindCoordinatorRequest {
    /// The group ID to find the coordinator for.
    pub key: String,
}

impl<W> WriteType<W> for FindCoordinatorRequest
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.key.write(writer)
    }
}

impl RequestBody for FindCoordinatorRequest {
    type ResponseBody = FindCoordinatorResponse;

    const API_KEY: ApiKey = ApiKey::FindCoordinator;

    /// Version 0 only knows group coordinators, which is all that is needed here.
    const API_VERSION: i16 = 0;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCoordinatorResponse {
    /// The error code, or 0 if there was no error.
    pub error: Option<Error>,

    /// The node ID.
    pub node_id: i32,

    /// The host name.
    pub host: String,

    /// The port.
    pub port: i32,
}

impl<R> ReadType<R> for FindCoordinatorResponse
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            error: Error::new(i16::read(reader)?),
            node_id: i32::read(reader)?,
            host: String::read(reader)?,
            port: i32::read(reader)?,
        })
    }
}
