use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::error::{Error, Result};
use crate::{
    cluster::{Broker, GroupDescription, GroupMember},
    connection::{self, BrokerConnection, ConnectionConfig},
    protocol::messages::{DescribeGroupsRequest, ListGroupsRequest},
};

/// Handle to a single broker, connected lazily.
///
/// A connection that got poisoned by a failed request counts as disconnected and is replaced on the next use.
#[derive(Debug)]
pub struct BrokerClient {
    addr: String,
    config: ConnectionConfig,
    conn: Mutex<Option<BrokerConnection>>,
}

impl BrokerClient {
    pub(crate) fn new(addr: String, config: ConnectionConfig) -> Self {
        Self {
            addr,
            config,
            conn: Mutex::new(None),
        }
    }

    async fn connection(&self) -> Result<BrokerConnection> {
        let existing = self
            .conn
            .lock()
            .as_ref()
            .filter(|c| !c.is_poisoned())
            .map(Arc::clone);
        if let Some(conn) = existing {
            return Ok(conn);
        }

        let conn = connection::connect(&self.addr, &self.config).await?;
        *self.conn.lock() = Some(Arc::clone(&conn));
        Ok(conn)
    }
}

#[async_trait]
impl Broker for BrokerClient {
    type Error = Error;

    fn addr(&self) -> &str {
        &self.addr
    }

    fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .as_ref()
            .is_some_and(|c| !c.is_poisoned())
    }

    async fn open(&self) -> Result<()> {
        let conn = connection::connect(&self.addr, &self.config).await?;
        *self.conn.lock() = Some(conn);
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        let response = self.connection().await?.request(&ListGroupsRequest).await?;
        if let Some(e) = response.error {
            return Err(Error::server(e, format!("list groups on {}", self.addr)));
        }

        debug!(broker = %self.addr, groups = response.groups.len(), "listed groups");
        Ok(response.groups.into_iter().map(|g| g.group_id).collect())
    }

    async fn describe_groups(&self, groups: &[String]) -> Result<Vec<GroupDescription>> {
        let request = DescribeGroupsRequest {
            groups: groups.to_vec(),
        };
        let response = self.connection().await?.request(&request).await?;

        Ok(response
            .groups
            .into_iter()
            .map(|g| GroupDescription {
                group_id: g.group_id,
                error: g.error,
                state: g.group_state,
                protocol_type: g.protocol_type,
                members: g
                    .members
                    .into_iter()
                    .map(|m| GroupMember {
                        member_id: m.member_id,
                        client_id: m.client_id,
                        client_host: m.client_host,
                        metadata: m.member_metadata.0,
                    })
                    .collect(),
            })
            .collect())
    }
}
