//! The subset of the Apache Kafka protocol needed to inspect a cluster.
//!
//! # References
//! - <https://kafka.apache.org/protocol>
//! - <https://kafka.apache.org/documentation>
pub mod api_key;
pub mod consumer;
pub mod error;
pub mod frame;
pub mod messages;
pub mod primitives;
pub mod traits;
