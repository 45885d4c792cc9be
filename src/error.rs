use std::io;

use strum_macros::{Display, IntoStaticStr};
use thiserror::Error as ThisError;

use crate::reply::Reply;

/// Coarse classification of an [`Error`], so callers can branch on the kind of failure instead
/// of matching on message contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Dial, read or write failure, including the peer closing the stream.
    Transport,
    /// The server sent bytes that do not form a valid reply.
    Protocol,
    /// The server answered with an error reply.
    Application,
    /// The server answered with the "no value" sentinel.
    Absent,
    /// The client was used in a way it does not support, or the server answered with a shape
    /// that makes no sense for the request.
    Usage,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("protocol error; {0}")]
    Protocol(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("key does not exist")]
    Absent,
    #[error("unexpected reply, expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: Reply,
    },
    #[error("usage error; {0}")]
    Usage(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::ConnectionClosed => ErrorKind::Transport,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Server(_) => ErrorKind::Application,
            Error::Absent => ErrorKind::Absent,
            Error::UnexpectedReply { .. } | Error::Usage(_) => ErrorKind::Usage,
        }
    }

    /// Whether the failure means the peer hung up on us. This is the only condition under which
    /// a command is retried on a fresh connection.
    pub fn is_connection_closed(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Error::Absent)
    }

    /// Whether the connection that produced this error can no longer be trusted with another
    /// request. Application level errors leave the stream in a consistent state.
    pub(crate) fn poisons_connection(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Protocol)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
