//! Embedded consumer protocol.
//!
//! Consumer groups that use the `consumer` protocol type carry a `ConsumerProtocolSubscription` in the member
//! metadata of every group member. Its layout is versioned independently of the group APIs, but every version starts
//! with the same two fields, so only those are decoded here.
//!
//! # References
//! - <https://github.com/apache/kafka/blob/trunk/clients/src/main/resources/common/message/ConsumerProtocolSubscription.json>

use std::io::Read;

use super::traits::{ReadError, ReadType, decode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSubscription {
    /// Version of the subscription payload.
    pub version: i16,

    /// Topics the member subscribed to, in the order the member sent them.
    pub topics: Vec<String>,
}

impl MemberSubscription {
    /// Decodes the member metadata bytes of a `DescribeGroups` member.
    ///
    /// User data, owned partitions and everything after them is ignored.
    pub fn decode(metadata: &[u8]) -> Result<Self, ReadError> {
        decode(metadata)
    }
}

impl<R> ReadType<R> for MemberSubscription
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let version = i16::read(reader)?;
        if version < 0 {
            return Err(ReadError::malformed(format!(
                "Invalid consumer protocol version: {version}"
            )));
        }

        Ok(Self {
            version,
            topics: ReadType::read(reader)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn encode_subscription(topics: &[&str]) -> Vec<u8> {
    use super::{primitives::Bytes, traits::WriteType};

    let mut buf = vec![];
    1i16.write(&mut buf).unwrap();
    topics
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .write(&mut buf)
        .unwrap();
    // user data
    Bytes(b"sticky".to_vec()).write(&mut buf).unwrap();
    // owned partitions
    0i32.write(&mut buf).unwrap();
    buf
}
