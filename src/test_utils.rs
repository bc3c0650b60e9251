//! In-memory cluster used by the unit tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    cluster::{Broker, Cluster, GroupDescription, GroupMember, OffsetFetcher},
    protocol::consumer::encode_subscription,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub(crate) struct FakeError(pub String);

fn fail<T>(msg: impl Into<String>) -> Result<T, FakeError> {
    Err(FakeError(msg.into()))
}

#[derive(Debug, Clone)]
pub(crate) struct FakeBroker {
    addr: String,
    reachable: bool,
    describe_fails: bool,
    connected: Arc<AtomicBool>,
    opens: Arc<AtomicUsize>,
    groups: Vec<GroupDescription>,
}

impl FakeBroker {
    pub(crate) fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_owned(),
            reachable: true,
            describe_fails: false,
            connected: Arc::new(AtomicBool::new(false)),
            opens: Arc::new(AtomicUsize::new(0)),
            groups: vec![],
        }
    }

    pub(crate) fn unreachable(addr: &str) -> Self {
        Self {
            reachable: false,
            ..Self::new(addr)
        }
    }

    /// Coordinates `group_id`, with one member per entry of `members`.
    pub(crate) fn with_group(mut self, group_id: &str, members: &[&[&str]]) -> Self {
        self.groups.push(GroupDescription {
            group_id: group_id.to_owned(),
            error: None,
            state: "Stable".to_owned(),
            protocol_type: "consumer".to_owned(),
            members: members
                .iter()
                .enumerate()
                .map(|(i, topics)| GroupMember {
                    member_id: format!("{group_id}-{i}"),
                    client_id: "app".to_owned(),
                    client_host: "/127.0.0.1".to_owned(),
                    metadata: encode_subscription(topics),
                })
                .collect(),
        });
        self
    }

    /// Coordinates `group_id`, but its only member sent unparseable metadata.
    pub(crate) fn with_garbled_group(mut self, group_id: &str) -> Self {
        self.groups.push(GroupDescription {
            group_id: group_id.to_owned(),
            error: None,
            state: "Stable".to_owned(),
            protocol_type: "consumer".to_owned(),
            members: vec![GroupMember {
                member_id: format!("{group_id}-0"),
                client_id: "app".to_owned(),
                client_host: "/127.0.0.1".to_owned(),
                metadata: vec![0x00],
            }],
        });
        self
    }

    pub(crate) fn failing_describe(mut self) -> Self {
        self.describe_fails = true;
        self
    }

    pub(crate) fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Broker for FakeBroker {
    type Error = FakeError;

    fn addr(&self) -> &str {
        &self.addr
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn open(&self) -> Result<(), FakeError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return fail(format!("{} unreachable", self.addr));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<String>, FakeError> {
        if !self.is_connected() {
            return fail("not connected");
        }
        Ok(self.groups.iter().map(|g| g.group_id.clone()).collect())
    }

    async fn describe_groups(&self, groups: &[String]) -> Result<Vec<GroupDescription>, FakeError> {
        if !self.is_connected() || self.describe_fails {
            return fail(format!("describe on {} failed", self.addr));
        }
        Ok(self
            .groups
            .iter()
            .filter(|g| groups.contains(&g.group_id))
            .cloned()
            .collect())
    }
}

#[derive(Debug)]
pub(crate) struct FakeOffsetManager {
    committed: BTreeMap<(String, i32), i64>,
}

#[async_trait]
impl OffsetFetcher for FakeOffsetManager {
    type Error = FakeError;

    async fn next_offset(&self, topic: &str, partition: i32) -> Result<i64, FakeError> {
        match self.committed.get(&(topic.to_owned(), partition)) {
            Some(offset) => Ok(*offset),
            None => fail(format!("no offset for {topic}/{partition}")),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeCluster {
    brokers: Vec<FakeBroker>,
    controller: Option<String>,
    topics: Vec<String>,
    partitions: BTreeMap<String, Vec<i32>>,
    latest: BTreeMap<(String, i32), i64>,
    committed: BTreeMap<(String, String, i32), i64>,
    no_manager: BTreeSet<String>,
    fail_topics: AtomicBool,
    fail_brokers: AtomicBool,
}

impl FakeCluster {
    pub(crate) fn new(controller: &str) -> Self {
        Self {
            controller: Some(controller.to_owned()),
            ..Default::default()
        }
    }

    pub(crate) fn without_controller() -> Self {
        Self::default()
    }

    pub(crate) fn broker(mut self, broker: FakeBroker) -> Self {
        self.brokers.push(broker);
        self
    }

    /// Adds a topic, `partitions` holds `(partition, high-water mark)`. A mark of `None` makes the fetch fail.
    pub(crate) fn topic(mut self, name: &str, partitions: &[(i32, Option<i64>)]) -> Self {
        self.topics.push(name.to_owned());
        self.partitions.insert(
            name.to_owned(),
            partitions.iter().map(|(p, _)| *p).collect(),
        );
        for (p, mark) in partitions {
            if let Some(mark) = mark {
                self.latest.insert((name.to_owned(), *p), *mark);
            }
        }
        self
    }

    /// Adds a topic whose partitions cannot be listed.
    pub(crate) fn broken_topic(mut self, name: &str) -> Self {
        self.topics.push(name.to_owned());
        self
    }

    /// Committed offsets of `group` on `topic`, partitions missing here fail to fetch.
    pub(crate) fn committed(mut self, group: &str, topic: &str, offsets: &[(i32, i64)]) -> Self {
        for (p, offset) in offsets {
            self.committed
                .insert((group.to_owned(), topic.to_owned(), *p), *offset);
        }
        self
    }

    pub(crate) fn without_offset_manager(mut self, group: &str) -> Self {
        self.no_manager.insert(group.to_owned());
        self
    }

    pub(crate) fn set_fail_topics(&self, fail: bool) {
        self.fail_topics.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_brokers(&self, fail: bool) {
        self.fail_brokers.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    type Error = FakeError;
    type Broker = FakeBroker;
    type OffsetManager = FakeOffsetManager;

    async fn brokers(&self) -> Result<Vec<FakeBroker>, FakeError> {
        if self.fail_brokers.load(Ordering::SeqCst) {
            return fail("metadata unavailable");
        }
        Ok(self.brokers.clone())
    }

    async fn controller(&self) -> Result<String, FakeError> {
        match &self.controller {
            Some(c) => Ok(c.clone()),
            None => fail("no controller"),
        }
    }

    async fn topics(&self) -> Result<Vec<String>, FakeError> {
        if self.fail_topics.load(Ordering::SeqCst) {
            return fail("metadata unavailable");
        }
        Ok(self.topics.clone())
    }

    async fn partitions(&self, topic: &str) -> Result<Vec<i32>, FakeError> {
        match self.partitions.get(topic) {
            Some(p) => Ok(p.clone()),
            None => fail(format!("unknown topic {topic}")),
        }
    }

    async fn latest_offset(&self, topic: &str, partition: i32) -> Result<i64, FakeError> {
        match self.latest.get(&(topic.to_owned(), partition)) {
            Some(offset) => Ok(*offset),
            None => fail(format!("leader of {topic}/{partition} unavailable")),
        }
    }

    async fn offset_manager(&self, group: &str) -> Result<FakeOffsetManager, FakeError> {
        if self.no_manager.contains(group) {
            return fail(format!("no coordinator for {group}"));
        }
        Ok(FakeOffsetManager {
            committed: self
                .committed
                .iter()
                .filter(|((g, _, _), _)| g == group)
                .map(|((_, t, p), o)| ((t.clone(), *p), *o))
                .collect(),
        })
    }
}
