use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI32, Ordering},
    },
    time::Duration,
};

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::protocol::{
    frame::{AsyncMessageRead, AsyncMessageWrite},
    messages::{RequestBody, RequestHeader, ResponseHeader},
    traits::{ReadError, ReadType, WriteError, WriteType},
};

/// Request/response exchange over a single broker connection.
///
/// Requests are serialized: the stream lock is held from writing the request until the matching response frame has
/// been read, so there is never more than one request in flight. This keeps the connection free of any background
/// task and makes a lost response easy to detect. Any failure that may leave the stream mid-frame poisons the
/// messenger. A poisoned messenger refuses further requests and must be replaced by a fresh connection.
#[derive(Debug)]
pub struct Messenger<RW> {
    stream: Mutex<RW>,
    correlation_id: AtomicI32,
    client_id: Arc<str>,
    max_message_size: usize,
    request_timeout: Duration,
    poisoned: AtomicBool,
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Cannot encode request")]
    Write(#[from] WriteError),

    #[error(transparent)]
    WriteMessage(#[from] crate::protocol::frame::WriteError),

    #[error("Cannot decode response")]
    Read(#[from] ReadError),

    #[error(transparent)]
    ReadMessage(#[from] crate::protocol::frame::ReadError),

    #[error("Correlation ID mismatch: sent {sent} but got {received}")]
    CorrelationIdMismatch { sent: i32, received: i32 },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection is poisoned by an earlier failure")]
    Poisoned,
}

impl RequestError {
    /// Errors after which the byte stream can no longer be trusted.
    fn poisons(&self) -> bool {
        matches!(
            self,
            Self::WriteMessage(_)
                | Self::ReadMessage(_)
                | Self::CorrelationIdMismatch { .. }
                | Self::Timeout(_)
        )
    }
}

impl<RW> Messenger<RW>
where
    RW: AsyncRead + AsyncWrite + Send + Unpin,
{
    pub fn new(
        stream: RW,
        client_id: Arc<str>,
        max_message_size: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            stream: Mutex::new(stream),
            correlation_id: AtomicI32::new(0),
            client_id,
            max_message_size,
            request_timeout,
            poisoned: AtomicBool::new(false),
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Relaxed)
    }

    pub async fn request<R>(&self, msg: &R) -> Result<R::ResponseBody, RequestError>
    where
        R: RequestBody + WriteType<Vec<u8>> + Sync,
        R::ResponseBody: ReadType<Cursor<Vec<u8>>>,
    {
        if self.is_poisoned() {
            return Err(RequestError::Poisoned);
        }

        let correlation_id = self.correlation_id.fetch_add(1, Ordering::SeqCst);
        let header = RequestHeader {
            request_api_key: R::API_KEY,
            request_api_version: R::API_VERSION,
            correlation_id,
            client_id: Some(self.client_id.to_string()),
        };

        let mut buf = Vec::new();
        header.write(&mut buf)?;
        msg.write(&mut buf)?;

        let mut stream = self.stream.lock().await;
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.exchange(&mut *stream, &buf, correlation_id),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(RequestError::Timeout(self.request_timeout)),
        };
        drop(stream);

        let mut data = match result {
            Ok(data) => data,
            Err(e) => {
                if e.poisons() {
                    warn!(%e, api_key = ?R::API_KEY, "poisoning connection");
                    self.poisoned.store(true, Ordering::Relaxed);
                }
                return Err(e);
            }
        };

        let body = R::ResponseBody::read(&mut data)?;
        debug!(api_key = ?R::API_KEY, correlation_id, "request done");
        Ok(body)
    }

    async fn exchange(
        &self,
        stream: &mut RW,
        buf: &[u8],
        correlation_id: i32,
    ) -> Result<Cursor<Vec<u8>>, RequestError> {
        stream.write_message(buf).await?;

        let msg = stream.read_message(self.max_message_size).await?;
        let mut cursor = Cursor::new(msg);
        let header = ResponseHeader::read(&mut cursor)?;
        if header.correlation_id != correlation_id {
            return Err(RequestError::CorrelationIdMismatch {
                sent: correlation_id,
                received: header.correlation_id,
            });
        }

        Ok(cursor)
    }
}
