//! Process configuration, from flags or the environment.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::client::DEFAULT_CLIENT_ID;

/// Periodically snapshots topics, consumer groups and lag of a Kafka cluster.
#[derive(Parser, Debug, Clone)]
#[command(name = "kfk-monitor", version, about, long_about = None)]
pub struct Config {
    /// Bootstrap brokers, comma separated
    #[arg(
        long = "broker-addr",
        value_name = "HOST:PORT",
        env = "BROKER_ADDR",
        value_delimiter = ',',
        default_value = "localhost:9092"
    )]
    pub brokers: Vec<String>,

    /// Seconds between two refreshes
    #[arg(
        long = "tick-interval",
        value_name = "SECS",
        env = "TICK_INTERVAL",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_interval_secs: u64,

    /// MongoDB connection string, persistence is disabled without one
    #[arg(long = "mongo-uri", value_name = "URI", env = "MONGO_URI")]
    pub mongo_uri: Option<String>,

    /// MongoDB database receiving the snapshots
    #[arg(long = "mongo-database", env = "MONGO_DATABASE", default_value = "kfk")]
    pub mongo_database: String,

    /// Address of the HTTP query interface
    #[arg(long = "listen-addr", env = "LISTEN_ADDR", default_value = "0.0.0.0:3300")]
    pub listen_addr: SocketAddr,

    /// Client ID sent to the brokers
    #[arg(long = "client-id", env = "CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,

    #[arg(long = "connect-timeout-ms", env = "CONNECT_TIMEOUT_MS", default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    #[arg(long = "request-timeout-ms", env = "REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Broker queries in flight per refresh stage
    #[arg(
        long = "fetch-concurrency",
        env = "FETCH_CONCURRENCY",
        default_value_t = 1,
        value_parser = positive
    )]
    pub fetch_concurrency: usize,

    /// Snapshot age after which it is reported stale [default: three tick intervals]
    #[arg(long = "stale-after", value_name = "SECS", env = "STALE_AFTER_SECS")]
    pub stale_after_secs: Option<u64>,
}

fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(
            self.stale_after_secs
                .unwrap_or(self.tick_interval_secs.saturating_mul(3)),
        )
    }

    /// The connection string, if persistence is enabled.
    pub fn mongo_uri(&self) -> Option<&str> {
        self.mongo_uri.as_deref().filter(|uri| !uri.trim().is_empty())
    }
}
