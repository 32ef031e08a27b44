//! Sink boundary
//!
//! The sink is the remote endpoint that opens transfer sessions and receives
//! chunks. Session ids are assigned by the sink.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audio::capture::StreamFormat;
use crate::error::SinkError;

/// Opaque handle of an open transfer, assigned by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(u32);

impl SessionId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the sink does with the chunks of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    /// Play back live as chunks arrive
    Stream,
    /// Save under a name
    Record,
}

/// Parameters for opening a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub kind: SessionKind,
    pub format: StreamFormat,
    /// Recording name; only set for [`SessionKind::Record`]
    pub name: Option<String>,
}

/// One transmitted unit of audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub session: SessionId,
    /// Position of this chunk within its session, starting at 0
    pub sequence: u64,
    pub samples: &'a [i16],
    pub is_final: bool,
}

impl Chunk<'_> {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Version token of the sink's connection. A change means the remote side
/// has been reset and any cached presentation must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectivityEpoch(u64);

impl ConnectivityEpoch {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Remote endpoint receiving sessions and chunks
pub trait Sink {
    /// Open a transfer and return the id the sink assigned to it
    fn open_session(&mut self, request: &OpenRequest) -> Result<SessionId, SinkError>;

    /// Deliver one chunk. Fire-and-forget: no acknowledgment is awaited.
    fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError>;

    /// Operator-visible status line on the remote side
    fn comment(&mut self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// Current connection version
    fn epoch(&self) -> ConnectivityEpoch;
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn open_session(&mut self, request: &OpenRequest) -> Result<SessionId, SinkError> {
        (**self).open_session(request)
    }

    fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError> {
        (**self).send_chunk(chunk)
    }

    fn comment(&mut self, text: &str) -> Result<(), SinkError> {
        (**self).comment(text)
    }

    fn epoch(&self) -> ConnectivityEpoch {
        (**self).epoch()
    }
}
