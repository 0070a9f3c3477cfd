//! Error types shared across the client.

use std::io;

use thiserror::Error;

use crate::offset::Offset;

/// Inbound event that breaks the feed's ordering contract.
///
/// Offending events are dropped so the buffer and offset stay in step.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A live event arrived before the connection's catch-up payload.
    #[error("live event {id} arrived before catch-up")]
    LiveBeforeCatchUp { id: u64 },
    /// A live event whose id does not advance the offset.
    #[error("event {id} does not advance offset {offset}")]
    StaleSequence { id: u64, offset: Offset },
}

impl ProtocolViolation {
    pub fn id(&self) -> u64 {
        match self {
            ProtocolViolation::LiveBeforeCatchUp { id }
            | ProtocolViolation::StaleSequence { id, .. } => *id,
        }
    }
}

/// Errors reported by a [`PushChannel`](crate::channel::PushChannel).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The handshake with the server failed.
    #[error("handshake failed: {0}")]
    Handshake(String),
    /// The server refused or failed the subscribe request.
    #[error("subscribe failed: {0}")]
    Subscribe(String),
    /// The client that owns the sink has stopped.
    #[error("log tail client has stopped")]
    ClientStopped,
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building a client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid log tail configuration: {0}")]
    InvalidConfig(String),
    /// Configuration text could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    /// Configuration text is not valid INI.
    #[error("{path} is invalid: {source}")]
    Ini {
        path: String,
        #[source]
        source: ini::ParseError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::handshake(ChannelError::Handshake("refused".into()), "handshake failed: refused")]
    #[case::other(ChannelError::Other("tls alert".into()), "tls alert")]
    #[case::stopped(ChannelError::ClientStopped, "log tail client has stopped")]
    fn channel_errors_render_their_cause(#[case] err: ChannelError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn violations_expose_the_offending_id() {
        let stale = ProtocolViolation::StaleSequence {
            id: 3,
            offset: Offset::new(5),
        };
        assert_eq!(stale.id(), 3);
        assert_eq!(stale.to_string(), "event 3 does not advance offset 5");
    }
}
