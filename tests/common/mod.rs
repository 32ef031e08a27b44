//! Fakes for the controller's collaborators

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use mic_stream_controller::audio::capture::{bytes_for, CaptureSource, StreamFormat};
use mic_stream_controller::audio::GainFactor;
use mic_stream_controller::controller::ControllerSettings;
use mic_stream_controller::error::{CaptureError, SinkError};
use mic_stream_controller::network::{Chunk, ConnectivityEpoch, OpenRequest, SessionId, Sink};
use mic_stream_controller::session::Mode;
use mic_stream_controller::ui::{ControlPoll, ControlSurface, Presenter};
use mic_stream_controller::Controller;

/// Samples per read with the default 256-byte buffer
pub const BLOCK_SAMPLES: usize = 128;

/// Capture source replaying a script; an exhausted script times out
#[derive(Default)]
pub struct ScriptedCapture {
    script: VecDeque<Result<Vec<i16>, CaptureError>>,
    pub reads: usize,
    pub last_timeout: Option<Duration>,
}

impl ScriptedCapture {
    pub fn push_block(&mut self, samples: Vec<i16>) {
        self.script.push_back(Ok(samples));
    }

    /// A full block where every sample is `value`
    pub fn push_full(&mut self, value: i16) {
        self.push_block(vec![value; BLOCK_SAMPLES]);
    }

    pub fn push_error(&mut self, error: CaptureError) {
        self.script.push_back(Err(error));
    }
}

impl CaptureSource for ScriptedCapture {
    fn read_block(&mut self, block: &mut [i16], timeout: Duration) -> Result<usize, CaptureError> {
        self.reads += 1;
        self.last_timeout = Some(timeout);
        match self.script.pop_front() {
            Some(Ok(samples)) => {
                let n = samples.len().min(block.len());
                block[..n].copy_from_slice(&samples[..n]);
                Ok(bytes_for(n))
            }
            Some(Err(e)) => Err(e),
            None => Err(CaptureError::Timeout),
        }
    }

    fn format(&self) -> StreamFormat {
        StreamFormat::default()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentChunk {
    pub session: SessionId,
    pub sequence: u64,
    pub samples: Vec<i16>,
    pub is_final: bool,
}

/// Sink recording every call
pub struct RecordingSink {
    pub next_id: u32,
    pub opens: Vec<OpenRequest>,
    pub chunks: Vec<SentChunk>,
    pub comments: Vec<String>,
    pub reject_open: bool,
    pub fail_next_chunk: Option<SinkError>,
    pub fail_next_comment: Option<SinkError>,
    pub epoch: ConnectivityEpoch,
}

impl RecordingSink {
    pub fn starting_at(next_id: u32) -> Self {
        Self {
            next_id,
            opens: Vec::new(),
            chunks: Vec::new(),
            comments: Vec::new(),
            reject_open: false,
            fail_next_chunk: None,
            fail_next_comment: None,
            epoch: ConnectivityEpoch::default(),
        }
    }

    pub fn chunk_sessions(&self) -> Vec<u32> {
        self.chunks.iter().map(|c| c.session.get()).collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl Sink for RecordingSink {
    fn open_session(&mut self, request: &OpenRequest) -> Result<SessionId, SinkError> {
        if self.reject_open {
            return Err(SinkError::Rejected("sink busy".into()));
        }
        self.opens.push(request.clone());
        let id = SessionId::new(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn send_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SinkError> {
        if let Some(e) = self.fail_next_chunk.take() {
            return Err(e);
        }
        self.chunks.push(SentChunk {
            session: chunk.session,
            sequence: chunk.sequence,
            samples: chunk.samples.to_vec(),
            is_final: chunk.is_final,
        });
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), SinkError> {
        if let Some(e) = self.fail_next_comment.take() {
            return Err(e);
        }
        self.comments.push(text.to_string());
        Ok(())
    }

    fn epoch(&self) -> ConnectivityEpoch {
        self.epoch
    }
}

/// Surface returning queued polls, then nothing
#[derive(Default)]
pub struct ScriptedSurface {
    polls: VecDeque<ControlPoll>,
}

impl ScriptedSurface {
    pub fn push(&mut self, poll: ControlPoll) {
        self.polls.push_back(poll);
    }
}

impl ControlSurface for ScriptedSurface {
    fn poll(&mut self) -> ControlPoll {
        self.polls.pop_front().unwrap_or_default()
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub modes: Vec<(Mode, bool)>,
    pub gains: Vec<u8>,
    pub statuses: Vec<String>,
    pub waveforms: usize,
}

impl Presenter for RecordingPresenter {
    fn show_mode(&mut self, mode: Mode, streaming: bool) {
        self.modes.push((mode, streaming));
    }

    fn show_gain(&mut self, gain: GainFactor) {
        self.gains.push(gain.get());
    }

    fn show_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }

    fn plot_waveform(&mut self, _samples: &[i16]) {
        self.waveforms += 1;
    }
}

pub type TestController =
    Controller<ScriptedCapture, RecordingSink, ScriptedSurface, RecordingPresenter>;

pub fn controller_with(sink: RecordingSink, gain: u8) -> TestController {
    let settings = ControllerSettings {
        initial_gain: GainFactor::clamped(gain as i32),
        ..ControllerSettings::default()
    };
    Controller::new(
        ScriptedCapture::default(),
        sink,
        ScriptedSurface::default(),
        RecordingPresenter::default(),
        settings,
    )
    .unwrap()
}

pub fn mic() -> ControlPoll {
    ControlPoll {
        mic_tab: true,
        ..Default::default()
    }
}

pub fn record() -> ControlPoll {
    ControlPoll {
        record_tab: true,
        ..Default::default()
    }
}

pub fn play() -> ControlPoll {
    ControlPoll {
        play_tab: true,
        ..Default::default()
    }
}

pub fn start() -> ControlPoll {
    ControlPoll {
        start: true,
        ..Default::default()
    }
}

pub fn stop() -> ControlPoll {
    ControlPoll {
        stop: true,
        ..Default::default()
    }
}

pub fn gain(position: usize) -> ControlPoll {
    ControlPoll {
        gain_position: Some(position),
        ..Default::default()
    }
}

/// Several interactions reported in the same poll
pub fn together(polls: &[ControlPoll]) -> ControlPoll {
    let mut merged = ControlPoll::default();
    for poll in polls {
        merged.merge(poll);
    }
    merged
}
