#![no_main]
use std::io::Cursor;

use kfk_monitor::protocol::{
    api_key::ApiKey,
    messages::{
        DescribeGroupsResponse, FindCoordinatorResponse, ListGroupsResponse, ListOffsetsResponse,
        MetadataResponse, OffsetFetchResponse, ResponseHeader,
    },
    traits::ReadType,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    driver(data).ok();
});

type Error = Box<dyn std::error::Error>;

fn driver(data: &[u8]) -> Result<(), Error> {
    let mut cursor = Cursor::new(data);

    let api_key = ApiKey::from(i16::read(&mut cursor)?);
    ResponseHeader::read(&mut cursor)?;

    match api_key {
        ApiKey::ListOffsets => {
            ListOffsetsResponse::read(&mut cursor)?;
        }
        ApiKey::Metadata => {
            MetadataResponse::read(&mut cursor)?;
        }
        ApiKey::OffsetFetch => {
            OffsetFetchResponse::read(&mut cursor)?;
        }
        ApiKey::FindCoordinator => {
            FindCoordinatorResponse::read(&mut cursor)?;
        }
        ApiKey::DescribeGroups => {
            DescribeGroupsResponse::read(&mut cursor)?;
        }
        ApiKey::ListGroups => {
            ListGroupsResponse::read(&mut cursor)?;
        }
        ApiKey::Unknown(_) => {}
    }

    Ok(())
}
