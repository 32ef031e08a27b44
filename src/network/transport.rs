//! Concrete sinks
//!
//! [`WriterSink`] encodes onto any `Write` (stdout, a serial port file, a
//! buffer in tests). [`TcpSink`] connects lazily and reconnects after a
//! failure, bumping its connectivity epoch each time a new connection is made.

use bytes::BytesMut;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::protocol::{encode, SinkMessage};
use super::sink::{Chunk, ConnectivityEpoch, OpenRequest, SessionId, Sink};
use crate::config::SinkCodec;
use crate::error::SinkError;

/// Encodes messages and writes them as one unit
struct FrameWriter {
    codec: SinkCodec,
    frame: BytesMut,
}

impl FrameWriter {
    fn new(codec: SinkCodec) -> Self {
        Self {
            codec,
            frame: BytesMut::with_capacity(1024),
        }
    }

    fn write<W: Write + ?Sized>(&mut self, writer: &mut W, message: &SinkMessage) -> Result<(), SinkError> {
        self.frame.clear();
        encode(self.codec, message, &mut self.frame)?;
        writer.write_all(&self.frame)?;
        writer.flush()?;
        Ok(())
    }
}

/// Sequential session id assignment, starting at 0
#[derive(Debug, Default)]
struct SessionIds {
    next: u32,
}

impl SessionIds {
    fn allocate(&mut self) -> SessionId {
        let id = SessionId::new(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Sink writing framed messages to a byte stream
pub struct WriterSink<W: Write> {
    writer: W,
    frames: FrameWriter,
    ids: SessionIds,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, codec: SinkCodec) -> Self {
        Self {
            writer,
            frames: FrameWriter::new(codec),
            ids: SessionIds::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn open_session(&mut self, request: &OpenRequest) -> Result<SessionId, SinkError> {
        let id = self.ids.allocate();
        self.frames
            .write(&mut self.writer, &SinkMessage::open(id, request))?;
        Ok(id)
    }

    fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError> {
        self.frames.write(&mut self.writer, &SinkMessage::chunk(chunk))
    }

    fn comment(&mut self, text: &str) -> Result<(), SinkError> {
        self.frames.write(&mut self.writer, &SinkMessage::comment(text))
    }

    fn epoch(&self) -> ConnectivityEpoch {
        ConnectivityEpoch::default()
    }
}

/// Sink over TCP with reconnect-on-next-use
pub struct TcpSink {
    address: String,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
    frames: FrameWriter,
    ids: SessionIds,
    epoch: ConnectivityEpoch,
}

impl TcpSink {
    pub fn new(address: impl Into<String>, codec: SinkCodec) -> Self {
        Self {
            address: address.into(),
            connect_timeout: Duration::from_secs(2),
            stream: None,
            frames: FrameWriter::new(codec),
            ids: SessionIds::default(),
            epoch: ConnectivityEpoch::default(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self) -> Result<(), SinkError> {
        let addr = self
            .address
            .to_socket_addrs()
            .map_err(|e| SinkError::Disconnected(format!("{}: {}", self.address, e)))?
            .next()
            .ok_or_else(|| SinkError::Disconnected(format!("{}: no address", self.address)))?;

        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)
            .map_err(|e| SinkError::Disconnected(format!("{}: {}", self.address, e)))?;
        stream.set_nodelay(true)?;

        self.stream = Some(stream);
        self.epoch = self.epoch.next();
        tracing::info!("Connected to sink {} (epoch {})", self.address, self.epoch.get());
        Ok(())
    }

    fn write_message(&mut self, message: &SinkMessage) -> Result<(), SinkError> {
        if self.stream.is_none() {
            self.connect()?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(SinkError::Disconnected(self.address.clone()));
        };

        match self.frames.write(stream, message) {
            Err(SinkError::Io(e)) => {
                tracing::warn!("Sink {} write failed: {}", self.address, e);
                self.stream = None;
                Err(SinkError::Disconnected(e.to_string()))
            }
            other => other,
        }
    }
}

impl Sink for TcpSink {
    fn open_session(&mut self, request: &OpenRequest) -> Result<SessionId, SinkError> {
        let id = self.ids.allocate();
        self.write_message(&SinkMessage::open(id, request))?;
        Ok(id)
    }

    fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError> {
        self.write_message(&SinkMessage::chunk(chunk))
    }

    fn comment(&mut self, text: &str) -> Result<(), SinkError> {
        self.write_message(&SinkMessage::comment(text))
    }

    fn epoch(&self) -> ConnectivityEpoch {
        self.epoch
    }
}
