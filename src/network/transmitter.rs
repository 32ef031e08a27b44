//! Chunk transmitter
//!
//! Frames captured buffers as chunks of the currently bound session and hands
//! them to the sink in capture order. No retries: a failed send is reported
//! to the caller and leaves a gap in the sequence numbers.

use super::sink::{Chunk, SessionId, Sink};
use crate::error::TransmitError;

/// Transmission counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitStats {
    pub chunks_sent: u64,
    pub samples_sent: u64,
    pub send_failures: u64,
}

pub struct ChunkTransmitter {
    /// Session chunks may currently be sent for
    bound: Option<SessionId>,
    next_sequence: u64,
    stats: TransmitStats,
}

impl ChunkTransmitter {
    pub fn new() -> Self {
        Self {
            bound: None,
            next_sequence: 0,
            stats: TransmitStats::default(),
        }
    }

    /// Start numbering chunks for a freshly opened session
    pub fn bind(&mut self, session: SessionId) {
        self.bound = Some(session);
        self.next_sequence = 0;
    }

    /// Stop accepting chunks; returns the previously bound session
    pub fn unbind(&mut self) -> Option<SessionId> {
        self.bound.take()
    }

    pub fn bound(&self) -> Option<SessionId> {
        self.bound
    }

    /// Sequence number the next chunk will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn stats(&self) -> TransmitStats {
        self.stats
    }

    /// Send `samples` as the next chunk of `session`.
    ///
    /// Returns the chunk's sequence number. Sending against a session that
    /// is not bound is a caller bug.
    pub fn send<K: Sink + ?Sized>(
        &mut self,
        sink: &mut K,
        session: SessionId,
        samples: &[i16],
        is_final: bool,
    ) -> Result<u64, TransmitError> {
        if self.bound != Some(session) {
            debug_assert!(
                false,
                "chunk sent against stale session {} (bound: {:?})",
                session, self.bound
            );
            return Err(TransmitError::StaleSession {
                expected: self.bound,
                got: session,
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let chunk = Chunk {
            session,
            sequence,
            samples,
            is_final,
        };

        match sink.send_chunk(&chunk) {
            Ok(()) => {
                self.stats.chunks_sent += 1;
                self.stats.samples_sent += samples.len() as u64;
                tracing::trace!(
                    "Sent chunk {} of session {} ({} samples)",
                    sequence,
                    session,
                    samples.len()
                );
                Ok(sequence)
            }
            Err(e) => {
                self.stats.send_failures += 1;
                Err(e.into())
            }
        }
    }
}

impl Default for ChunkTransmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::network::sink::{ConnectivityEpoch, OpenRequest};

    #[derive(Default)]
    struct VecSink {
        chunks: Vec<(SessionId, u64, Vec<i16>)>,
        fail_next: bool,
    }

    impl Sink for VecSink {
        fn open_session(&mut self, _request: &OpenRequest) -> Result<SessionId, SinkError> {
            Ok(SessionId::new(0))
        }

        fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(SinkError::Rejected("busy".into()));
            }
            self.chunks
                .push((chunk.session, chunk.sequence, chunk.samples.to_vec()));
            Ok(())
        }

        fn epoch(&self) -> ConnectivityEpoch {
            ConnectivityEpoch::default()
        }
    }

    #[test]
    fn test_sequences_in_order() {
        let mut sink = VecSink::default();
        let mut tx = ChunkTransmitter::new();
        let id = SessionId::new(7);
        tx.bind(id);

        assert_eq!(tx.send(&mut sink, id, &[1, 2], false).unwrap(), 0);
        assert_eq!(tx.send(&mut sink, id, &[3], false).unwrap(), 1);

        assert_eq!(
            sink.chunks,
            vec![(id, 0, vec![1, 2]), (id, 1, vec![3])]
        );
        assert_eq!(tx.stats().chunks_sent, 2);
        assert_eq!(tx.stats().samples_sent, 3);
    }

    #[test]
    fn test_failed_send_leaves_gap() {
        let mut sink = VecSink::default();
        let mut tx = ChunkTransmitter::new();
        let id = SessionId::new(1);
        tx.bind(id);

        tx.send(&mut sink, id, &[1], false).unwrap();
        sink.fail_next = true;
        assert!(matches!(
            tx.send(&mut sink, id, &[2], false),
            Err(TransmitError::Sink(SinkError::Rejected(_)))
        ));
        tx.send(&mut sink, id, &[3], false).unwrap();

        let sequences: Vec<u64> = sink.chunks.iter().map(|c| c.1).collect();
        assert_eq!(sequences, vec![0, 2]);
        assert_eq!(tx.stats().send_failures, 1);
    }

    #[test]
    fn test_rebind_restarts_sequence() {
        let mut sink = VecSink::default();
        let mut tx = ChunkTransmitter::new();
        tx.bind(SessionId::new(1));
        tx.send(&mut sink, SessionId::new(1), &[1], false).unwrap();
        assert_eq!(tx.unbind(), Some(SessionId::new(1)));

        tx.bind(SessionId::new(2));
        assert_eq!(tx.next_sequence(), 0);
        assert_eq!(tx.send(&mut sink, SessionId::new(2), &[1], false).unwrap(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stale session")]
    fn test_stale_session_panics_in_debug() {
        let mut sink = VecSink::default();
        let mut tx = ChunkTransmitter::new();
        tx.bind(SessionId::new(1));
        tx.unbind();
        let _ = tx.send(&mut sink, SessionId::new(1), &[1], false);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_stale_session_rejected_in_release() {
        let mut sink = VecSink::default();
        let mut tx = ChunkTransmitter::new();
        tx.bind(SessionId::new(1));
        let err = tx.send(&mut sink, SessionId::new(2), &[1], false).unwrap_err();
        assert!(matches!(err, TransmitError::StaleSession { .. }));
        assert!(sink.chunks.is_empty());
    }
}
