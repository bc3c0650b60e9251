//! Error codes returned by brokers.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_error_codes>

use thiserror::Error;

/// A broker-side error code.
///
/// Only the codes the requests of this crate can plausibly produce get a dedicated variant, everything else is
/// carried through as [`Error::Unknown`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    #[error("The server experienced an unexpected error when processing the request")]
    UnknownServerError,

    #[error("The requested offset is not within the range of offsets maintained by the server")]
    OffsetOutOfRange,

    #[error("This server does not host this topic-partition")]
    UnknownTopicOrPartition,

    #[error("There is no leader for this topic-partition as we are in the middle of a leadership election")]
    LeaderNotAvailable,

    #[error("This server is not the leader for that topic-partition")]
    NotLeaderOrFollower,

    #[error("The request timed out")]
    RequestTimedOut,

    #[error("The coordinator is loading and hence can't process requests")]
    CoordinatorLoadInProgress,

    #[error("The coordinator is not available")]
    CoordinatorNotAvailable,

    #[error("This is not the correct coordinator")]
    NotCoordinator,

    #[error("The configured groupId is invalid")]
    InvalidGroupId,

    #[error("Topic authorization failed")]
    TopicAuthorizationFailed,

    #[error("Group authorization failed")]
    GroupAuthorizationFailed,

    #[error("Cluster authorization failed")]
    ClusterAuthorizationFailed,

    #[error("The version of API is not supported")]
    UnsupportedVersion,

    #[error("The group id does not exist")]
    GroupIdNotFound,

    #[error("Unknown error code {0}")]
    Unknown(i16),
}

impl Error {
    /// Maps a wire error code, `0` means "no error".
    pub fn new(code: i16) -> Option<Self> {
        match code {
            0 => None,
            -1 => Some(Self::UnknownServerError),
            1 => Some(Self::OffsetOutOfRange),
            3 => Some(Self::UnknownTopicOrPartition),
            5 => Some(Self::LeaderNotAvailable),
            6 => Some(Self::NotLeaderOrFollower),
            7 => Some(Self::RequestTimedOut),
            14 => Some(Self::CoordinatorLoadInProgress),
            15 => Some(Self::CoordinatorNotAvailable),
            16 => Some(Self::NotCoordinator),
            24 => Some(Self::InvalidGroupId),
            29 => Some(Self::TopicAuthorizationFailed),
            30 => Some(Self::GroupAuthorizationFailed),
            31 => Some(Self::ClusterAuthorizationFailed),
            35 => Some(Self::UnsupportedVersion),
            69 => Some(Self::GroupIdNotFound),
            other => Some(Self::Unknown(other)),
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::UnknownServerError => -1,
            Self::OffsetOutOfRange => 1,
            Self::UnknownTopicOrPartition => 3,
            Self::LeaderNotAvailable => 5,
            Self::NotLeaderOrFollower => 6,
            Self::RequestTimedOut => 7,
            Self::CoordinatorLoadInProgress => 14,
            Self::CoordinatorNotAvailable => 15,
            Self::NotCoordinator => 16,
            Self::InvalidGroupId => 24,
            Self::TopicAuthorizationFailed => 29,
            Self::GroupAuthorizationFailed => 30,
            Self::ClusterAuthorizationFailed => 31,
            Self::UnsupportedVersion => 35,
            Self::GroupIdNotFound => 69,
            Self::Unknown(code) => *code,
        }
    }
}
