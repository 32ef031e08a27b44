//! Error types for the capture and streaming controller

use thiserror::Error;

use crate::network::sink::SessionId;
use crate::session::Mode;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Transmit error: {0}")]
    Transmit(#[from] TransmitError),

    /// The sink dropped the transport while a session was streaming.
    /// The session has already been closed when this is returned.
    #[error("Session {session} lost: {source}")]
    SessionLost {
        session: SessionId,
        #[source]
        source: SinkError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capture source failures. Both are transient: the tick is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture timed out")]
    Timeout,

    #[error("Capture device error: {0}")]
    Device(String),
}

/// Sample buffer arithmetic violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Odd byte count from capture: {0}")]
    OddByteCount(usize),

    #[error("Capture produced {bytes} bytes into a {capacity}-byte buffer")]
    Overrun { bytes: usize, capacity: usize },

    #[error("Invalid buffer capacity: {0} bytes")]
    InvalidCapacity(usize),
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Sink rejected {mode} session: {source}")]
    OpenRejected {
        mode: Mode,
        #[source]
        source: SinkError,
    },
}

/// Errors reported by a sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Rejected by sink: {0}")]
    Rejected(String),

    #[error("Sink disconnected: {0}")]
    Disconnected(String),

    #[error("Sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl SinkError {
    /// Whether the transport itself is gone (as opposed to one failed request)
    pub fn is_fatal(&self) -> bool {
        match self {
            SinkError::Disconnected(_) => true,
            SinkError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
            ),
            SinkError::Rejected(_) | SinkError::Encode(_) => false,
        }
    }
}

/// Chunk transmitter errors
#[derive(Error, Debug)]
pub enum TransmitError {
    #[error("Chunk for session {got} but bound session is {expected:?}")]
    StaleSession {
        expected: Option<SessionId>,
        got: SessionId,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_sink_error_fatality() {
        assert!(SinkError::Disconnected("reset".into()).is_fatal());
        assert!(SinkError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
        assert!(!SinkError::Io(io::Error::from(io::ErrorKind::WouldBlock)).is_fatal());
        assert!(!SinkError::Rejected("busy".into()).is_fatal());
        assert!(!SinkError::Encode("bad".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::from(BufferError::OddByteCount(255));
        assert_eq!(err.to_string(), "Buffer error: Odd byte count from capture: 255");

        let err = Error::SessionLost {
            session: SessionId::new(7),
            source: SinkError::Disconnected("peer closed".into()),
        };
        assert_eq!(err.to_string(), "Session #7 lost: Sink disconnected: peer closed");
    }
}
