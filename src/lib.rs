#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    rust_2018_idioms,
    unsafe_code
)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]
//! Periodic snapshots of a Kafka cluster: topics, partitions, consumer groups and how far each group got.
//!
//! A [`Monitor`](monitor::Monitor) runs the [refresh pipeline](pipeline) against a [`Cluster`](cluster::Cluster),
//! publishes the result through a [`SnapshotPublisher`](publisher::SnapshotPublisher) for the [HTTP interface](http)
//! and optionally persists it to a [sink](sink).

pub mod client;
pub mod cluster;
pub mod config;
pub mod connection;
pub mod http;
pub mod messenger;
pub mod monitor;
pub mod pipeline;
pub mod protocol;
pub mod publisher;
pub mod registry;
pub mod sink;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_utils;

pub type ProtocolError = protocol::error::Error;
