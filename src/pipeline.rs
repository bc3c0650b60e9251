//! The refresh pipeline.
//!
//! One refresh runs five stages, strictly one after another, each reading what the previous ones collected:
//!
//! 1. topics and their partitions
//! 2. consumer groups, per broker
//! 3. high-water marks, per partition
//! 4. group subscriptions, per broker
//! 5. committed offsets, per subscribed topic and partition
//!
//! Failures of single items are logged and leave a gap, only failing to resolve the controller or to list the topics
//! ends a refresh early. Within a stage independent queries may run concurrently, results are always applied in the
//! order they were issued.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::{StreamExt, stream};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cluster::{Broker, Cluster, OffsetFetcher},
    registry::BrokerRegistry,
    snapshot::{SnapshotBuilder, summary::UNKNOWN_OFFSET},
};

/// Internal topic holding committed offsets, never reported.
pub const OFFSETS_TOPIC: &str = "__consumer_offsets";

/// Protocol type of groups whose member metadata is a consumer subscription.
const CONSUMER_PROTOCOL: &str = "consumer";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Cannot resolve the cluster controller: {0}")]
    Controller(#[source] BoxError),

    #[error("Cannot list topics: {0}")]
    Topics(#[source] BoxError),
}

impl RefreshError {
    /// Whether the process cannot sensibly continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Controller(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    /// Upper bound of queries in flight within one stage.
    pub fetch_concurrency: usize,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            fetch_concurrency: 1,
        }
    }
}

/// Runs one refresh cycle and returns the collected, not yet summarized, snapshot.
pub async fn refresh<C>(
    cluster: &C,
    registry: &mut BrokerRegistry<C::Broker>,
    options: &RefreshOptions,
) -> Result<SnapshotBuilder, RefreshError>
where
    C: Cluster,
{
    let concurrency = options.fetch_concurrency.max(1);
    let mut builder = SnapshotBuilder::new(Utc::now());

    match cluster.brokers().await {
        Ok(brokers) => registry.sync(brokers),
        Err(e) => warn!(%e, "Cannot refresh broker membership, using the previous one"),
    }
    builder.brokers.members = registry.addrs();
    builder.brokers.controller = cluster
        .controller()
        .await
        .map_err(|e| RefreshError::Controller(Box::new(e)))?;

    discover_topics(cluster, &mut builder, concurrency).await?;
    let groups = discover_groups(registry, concurrency).await;
    fetch_available_offsets(cluster, &mut builder, concurrency).await;
    discover_subscriptions(registry, &groups, &mut builder, concurrency).await;
    fetch_next_offsets(cluster, &mut builder, concurrency).await;

    info!(
        brokers = builder.brokers.members.len(),
        topics = builder.topics.len(),
        subscribers = builder.subscribers.len(),
        "Refresh done"
    );
    Ok(builder)
}

async fn discover_topics<C>(
    cluster: &C,
    builder: &mut SnapshotBuilder,
    concurrency: usize,
) -> Result<(), RefreshError>
where
    C: Cluster,
{
    let names = cluster
        .topics()
        .await
        .map_err(|e| RefreshError::Topics(Box::new(e)))?;

    let listed: Vec<_> = stream::iter(names.into_iter().filter(|n| n != OFFSETS_TOPIC))
        .map(|name| async move {
            let partitions = cluster.partitions(&name).await;
            (name, partitions)
        })
        .buffered(concurrency)
        .collect()
        .await;

    for (name, partitions) in listed {
        match partitions {
            Ok(partitions) => {
                if let Err(e) = builder.topics.add_topic(name, partitions) {
                    warn!(%e, "Skipping topic");
                }
            }
            Err(e) => warn!(%e, topic = %name, "Cannot list partitions, skipping topic"),
        }
    }

    debug!(topics = builder.topics.len(), "Discovered topics");
    Ok(())
}

/// Group IDs per broker address. Unreachable brokers have no entry.
async fn discover_groups<B>(
    registry: &mut BrokerRegistry<B>,
    concurrency: usize,
) -> BTreeMap<String, Vec<String>>
where
    B: Broker,
{
    let connected = registry.connect_all().await;
    let registry = &*registry;

    let listed: Vec<_> = stream::iter(connected.iter().filter_map(|addr| registry.get(addr)))
        .map(|broker| async move { (broker.addr(), broker.list_groups().await) })
        .buffered(concurrency)
        .collect()
        .await;

    let mut groups = BTreeMap::new();
    for (addr, listed) in listed {
        match listed {
            Ok(ids) => {
                debug!(broker = addr, groups = ids.len(), "Listed groups");
                groups.insert(addr.to_owned(), ids);
            }
            Err(e) => warn!(%e, broker = addr, "Cannot list groups"),
        }
    }
    groups
}

async fn fetch_available_offsets<C>(cluster: &C, builder: &mut SnapshotBuilder, concurrency: usize)
where
    C: Cluster,
{
    let requests: Vec<(usize, String, i32)> = builder
        .topics
        .iter()
        .enumerate()
        .flat_map(|(i, t)| t.partitions.iter().map(move |&p| (i, t.name.clone(), p)))
        .collect();

    let fetched: Vec<(usize, i64)> = stream::iter(requests)
        .map(|(i, topic, partition)| async move {
            let offset = match cluster.latest_offset(&topic, partition).await {
                Ok(offset) => offset,
                Err(e) => {
                    warn!(%e, topic = %topic, partition, "Cannot fetch available offset, using 0");
                    0
                }
            };
            (i, offset)
        })
        .buffered(concurrency)
        .collect()
        .await;

    for (i, offset) in fetched {
        builder.topics.push_available_offset(i, offset);
    }
}

async fn discover_subscriptions<B>(
    registry: &mut BrokerRegistry<B>,
    groups: &BTreeMap<String, Vec<String>>,
    builder: &mut SnapshotBuilder,
    concurrency: usize,
) where
    B: Broker,
{
    let mut targets = Vec::new();
    for addr in registry.addrs() {
        let Some(ids) = groups.get(&addr).filter(|ids| !ids.is_empty()) else {
            continue;
        };
        if registry.ensure_connected(&addr).await {
            targets.push((addr, ids.as_slice()));
        }
    }

    let registry = &*registry;
    let described: Vec<_> = stream::iter(
        targets
            .iter()
            .filter_map(|(addr, ids)| Some((registry.get(addr)?, *ids))),
    )
    .map(|(broker, ids)| async move { (broker.addr(), broker.describe_groups(ids).await) })
    .buffered(concurrency)
    .collect()
    .await;

    for (addr, descriptions) in described {
        let descriptions = match descriptions {
            Ok(descriptions) => descriptions,
            Err(e) => {
                warn!(%e, broker = addr, "Cannot describe groups, skipping broker");
                continue;
            }
        };

        for group in descriptions {
            if let Some(e) = group.error {
                warn!(%e, group = %group.group_id, "Cannot describe group");
                continue;
            }
            if !group.protocol_type.is_empty() && group.protocol_type != CONSUMER_PROTOCOL {
                debug!(
                    group = %group.group_id,
                    protocol_type = %group.protocol_type,
                    "Skipping non-consumer group"
                );
                continue;
            }

            for member in &group.members {
                let subscription = match member.subscription() {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        warn!(
                            %e,
                            group = %group.group_id,
                            member = %member.member_id,
                            "Cannot decode member metadata"
                        );
                        continue;
                    }
                };

                for topic in &subscription.topics {
                    if !builder.record_subscription(topic, &group.group_id) {
                        debug!(group = %group.group_id, topic = %topic, "Subscribed topic not in snapshot");
                    }
                }
            }
        }
    }
}

async fn fetch_next_offsets<C>(cluster: &C, builder: &mut SnapshotBuilder, concurrency: usize)
where
    C: Cluster,
{
    let pairs: Vec<(usize, String, String, Vec<i32>)> = builder
        .topics
        .iter()
        .enumerate()
        .flat_map(|(i, t)| {
            t.subscribers
                .iter()
                .map(move |s| (i, t.name.clone(), s.group_id.clone(), t.partitions.clone()))
        })
        .collect();

    let fetched: Vec<(usize, String, Vec<i64>)> = stream::iter(pairs)
        .map(|(i, topic, group, partitions)| async move {
            let manager = match cluster.offset_manager(&group).await {
                Ok(manager) => manager,
                Err(e) => {
                    warn!(%e, group = %group, topic = %topic, "Cannot get offset manager, skipping");
                    return (i, group, vec![]);
                }
            };

            let mut offsets = Vec::with_capacity(partitions.len());
            for partition in partitions {
                let offset = match manager.next_offset(&topic, partition).await {
                    Ok(offset) => offset,
                    Err(e) => {
                        debug!(%e, group = %group, topic = %topic, partition, "Next offset unknown");
                        UNKNOWN_OFFSET
                    }
                };
                offsets.push(offset);
            }
            (i, group, offsets)
        })
        .buffered(concurrency)
        .collect()
        .await;

    for (i, group, offsets) in fetched {
        for offset in offsets {
            builder.topics.add_next_offset(i, &group, offset);
        }
    }
}
