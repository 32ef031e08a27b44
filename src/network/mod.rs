//! Sink side: session/chunk boundary, framing and transports

pub mod protocol;
pub mod sink;
pub mod transmitter;
pub mod transport;

pub use protocol::SinkMessage;
pub use sink::{Chunk, ConnectivityEpoch, OpenRequest, SessionId, SessionKind, Sink};
pub use transmitter::{ChunkTransmitter, TransmitStats};
pub use transport::{TcpSink, WriterSink};
