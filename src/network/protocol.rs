//! Sink wire messages
//!
//! Two framings are supported:
//! - `Binary`: `[len: u32 LE][bincode payload]`
//! - `Json`: one JSON object per line

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use super::sink::{Chunk, OpenRequest, SessionId, SessionKind};
use crate::config::SinkCodec;
use crate::error::SinkError;

/// Largest accepted frame payload
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

const LENGTH_PREFIX_BYTES: usize = 4;

/// Message sent to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkMessage {
    OpenStream {
        session: u32,
        sample_rate: u32,
        channels: u16,
    },
    OpenRecording {
        session: u32,
        name: String,
        sample_rate: u32,
        channels: u16,
    },
    Chunk {
        session: u32,
        sequence: u64,
        is_final: bool,
        samples: Vec<i16>,
    },
    Comment {
        text: String,
    },
}

impl SinkMessage {
    pub fn open(session: SessionId, request: &OpenRequest) -> Self {
        match request.kind {
            SessionKind::Stream => SinkMessage::OpenStream {
                session: session.get(),
                sample_rate: request.format.sample_rate,
                channels: request.format.channels,
            },
            SessionKind::Record => SinkMessage::OpenRecording {
                session: session.get(),
                name: request.name.clone().unwrap_or_default(),
                sample_rate: request.format.sample_rate,
                channels: request.format.channels,
            },
        }
    }

    pub fn chunk(chunk: &Chunk<'_>) -> Self {
        SinkMessage::Chunk {
            session: chunk.session.get(),
            sequence: chunk.sequence,
            is_final: chunk.is_final,
            samples: chunk.samples.to_vec(),
        }
    }

    pub fn comment(text: &str) -> Self {
        SinkMessage::Comment {
            text: text.to_string(),
        }
    }
}

/// Append one framed message to `out`
pub fn encode(codec: SinkCodec, message: &SinkMessage, out: &mut BytesMut) -> Result<(), SinkError> {
    match codec {
        SinkCodec::Binary => {
            let payload =
                bincode::serialize(message).map_err(|e| SinkError::Encode(e.to_string()))?;
            if payload.len() > MAX_FRAME_BYTES {
                return Err(SinkError::Encode(format!(
                    "frame of {} bytes exceeds {}",
                    payload.len(),
                    MAX_FRAME_BYTES
                )));
            }
            out.reserve(LENGTH_PREFIX_BYTES + payload.len());
            out.put_u32_le(payload.len() as u32);
            out.put_slice(&payload);
        }
        SinkCodec::Json => {
            serde_json::to_writer((&mut *out).writer(), message)
                .map_err(|e| SinkError::Encode(e.to_string()))?;
            out.put_u8(b'\n');
        }
    }
    Ok(())
}

/// Take one complete message off the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed.
pub fn decode(codec: SinkCodec, buf: &mut BytesMut) -> Result<Option<SinkMessage>, SinkError> {
    match codec {
        SinkCodec::Binary => {
            if buf.len() < LENGTH_PREFIX_BYTES {
                return Ok(None);
            }
            let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
            if len > MAX_FRAME_BYTES {
                return Err(SinkError::Encode(format!("frame length {} too large", len)));
            }
            if buf.len() < LENGTH_PREFIX_BYTES + len {
                return Ok(None);
            }
            buf.advance(LENGTH_PREFIX_BYTES);
            let frame = buf.split_to(len);
            bincode::deserialize(&frame)
                .map(Some)
                .map_err(|e| SinkError::Encode(e.to_string()))
        }
        SinkCodec::Json => {
            let Some(pos) = buf.iter().position(|b| *b == b'\n') else {
                return Ok(None);
            };
            let line = buf.split_to(pos + 1);
            serde_json::from_slice(&line[..pos])
                .map(Some)
                .map_err(|e| SinkError::Encode(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::StreamFormat;

    fn record_request() -> OpenRequest {
        OpenRequest {
            kind: SessionKind::Record,
            format: StreamFormat::default(),
            name: Some("recorded_sound".into()),
        }
    }

    #[test]
    fn test_binary_frame_layout() {
        let mut out = BytesMut::new();
        let message = SinkMessage::comment("hi");
        encode(SinkCodec::Binary, &message, &mut out).unwrap();

        let len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        assert_eq!(out.len(), 4 + len);
        assert_eq!(decode(SinkCodec::Binary, &mut out).unwrap(), Some(message));
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_line() {
        let mut out = BytesMut::new();
        let message = SinkMessage::open(SessionId::new(3), &record_request());
        encode(SinkCodec::Json, &message, &mut out).unwrap();

        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.contains("\"open_recording\""));
        assert!(text.contains("\"recorded_sound\""));
    }

    #[test]
    fn test_decode_waits_for_complete_frame() {
        for codec in [SinkCodec::Binary, SinkCodec::Json] {
            let mut full = BytesMut::new();
            let chunk = Chunk {
                session: SessionId::new(1),
                sequence: 4,
                samples: &[1, -1, 300],
                is_final: false,
            };
            encode(codec, &SinkMessage::chunk(&chunk), &mut full).unwrap();

            let mut partial = BytesMut::from(&full[..full.len() - 1]);
            assert_eq!(decode(codec, &mut partial).unwrap(), None);

            let decoded = decode(codec, &mut full).unwrap().unwrap();
            assert_eq!(
                decoded,
                SinkMessage::Chunk {
                    session: 1,
                    sequence: 4,
                    is_final: false,
                    samples: vec![1, -1, 300],
                }
            );
        }
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32_le((MAX_FRAME_BYTES + 1) as u32);
        assert!(decode(SinkCodec::Binary, &mut buf).is_err());
    }

    #[test]
    fn test_stream_open_has_no_name() {
        let request = OpenRequest {
            kind: SessionKind::Stream,
            format: StreamFormat::default(),
            name: None,
        };
        assert_eq!(
            SinkMessage::open(SessionId::new(0), &request),
            SinkMessage::OpenStream {
                session: 0,
                sample_rate: 16_000,
                channels: 1,
            }
        );
    }
}
