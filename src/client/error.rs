use thiserror::Error;

use crate::protocol::error::Error as ProtocolError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(#[from] crate::connection::Error),

    #[error("Request error: {0}")]
    Request(#[from] crate::messenger::RequestError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Server error {protocol_error:?} with context \"{context}\"")]
    ServerError {
        protocol_error: ProtocolError,
        context: String,
    },

    #[error("Unknown broker: {0}")]
    UnknownBroker(i32),

    #[error("No broker reachable")]
    NoBrokers,
}

impl Error {
    pub(crate) fn server(protocol_error: ProtocolError, context: impl Into<String>) -> Self {
        Self::ServerError {
            protocol_error,
            context: context.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
