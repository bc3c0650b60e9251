//! Individual API messages.
//!
//! Every request is pinned to a single API version. The chosen versions are old enough to be served by any broker
//! still in the wild (0.10.1+) and new enough to carry what a cluster inspection needs, so no `ApiVersions`
//! negotiation takes place.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_messages>

use std::io::{Read, Write};

use super::{
    api_key::ApiKey,
    traits::{ReadError, ReadType, WriteError, WriteType},
};

mod describe_groups;
pub use describe_groups::*;
mod find_coordinator;
pub use find_coordinator::*;
mod list_groups;
pub use list_groups::*;
mod list_offsets;
pub use list_offsets::*;
mod metadata;
pub use metadata::*;
mod offset_fetch;
pub use offset_fetch::*;

pub trait RequestBody {
    type ResponseBody;

    const API_KEY: ApiKey;

    /// The single version this crate speaks for this API.
    const API_VERSION: i16;
}

/// Request header, version 1.
#[derive(Debug)]
pub struct RequestHeader {
    /// The API key of this request.
    pub request_api_key: ApiKey,

    /// The API version of this request.
    pub request_api_version: i16,

    /// The correlation ID of this request.
    pub correlation_id: i32,

    /// The client ID string.
    pub client_id: Option<String>,
}

impl<W> WriteType<W> for RequestHeader
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        i16::from(self.request_api_key).write(writer)?;
        self.request_api_version.write(writer)?;
        self.correlation_id.write(writer)?;
        self.client_id.write(writer)?;
        Ok(())
    }
}

/// Response header, version 0.
#[derive(Debug)]
pub struct ResponseHeader {
    /// The correlation ID of this response.
    pub correlation_id: i32,
}

impl<R> ReadType<R> for ResponseHeader
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            correlation_id: i32::read(reader)?,
        })
    }
}
