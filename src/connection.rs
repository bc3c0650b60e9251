use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{io::BufStream, net::TcpStream};
use tracing::{debug, info};

use crate::messenger::Messenger;

pub use self::topology::BrokerTopology;

mod topology;

/// A connection to a broker
pub type BrokerConnection = Arc<MessengerTransport>;
pub type MessengerTransport = Messenger<BufStream<TcpStream>>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("error connecting to broker \"{broker}\": {error}")]
    Transport {
        broker: String,
        error: std::io::Error,
    },

    #[error("connecting to broker \"{broker}\" timed out after {timeout:?}")]
    Timeout { broker: String, timeout: Duration },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Settings shared by every connection a client opens.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub client_id: Arc<str>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_message_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            client_id: Arc::from(crate::client::DEFAULT_CLIENT_ID),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            max_message_size: 100 * 1024 * 1024,
        }
    }
}

/// Opens a plain TCP connection to `broker` (`host:port`).
pub async fn connect(broker: &str, config: &ConnectionConfig) -> Result<BrokerConnection> {
    info!(broker, "Establishing new connection");

    let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(broker)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(error)) => {
            return Err(Error::Transport {
                broker: broker.to_owned(),
                error,
            });
        }
        Err(_) => {
            return Err(Error::Timeout {
                broker: broker.to_owned(),
                timeout: config.connect_timeout,
            });
        }
    };

    // Requests are small and strictly request/response, don't wait for more data.
    stream.set_nodelay(true).map_err(|error| Error::Transport {
        broker: broker.to_owned(),
        error,
    })?;

    debug!(broker, "Connection established");

    Ok(Arc::new(Messenger::new(
        BufStream::new(stream),
        Arc::clone(&config.client_id),
        config.max_message_size,
        config.request_timeout,
    )))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let conn = connect(&addr, &ConnectionConfig::default()).await.unwrap();
        assert!(!conn.is_poisoned());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // grab a free port, then close it again
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = connect(&addr, &ConnectionConfig::default()).await.unwrap_err();
        assert_matches!(err, Error::Transport { broker, .. } if broker == addr);
    }
}
