//! Polling loop
//!
//! One [`Controller::tick`] per iteration:
//! 1. poll the control surface and apply its commands
//! 2. redraw presentation that changed
//! 3. if a session is active, capture one buffer, amplify it and send it
//!
//! The capture read is the only call that may block, bounded by the
//! configured timeout. Stop requests take effect at the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::audio::buffer::SampleBuffer;
use crate::audio::capture::CaptureSource;
use crate::audio::gain::{apply_gain, GainFactor};
use crate::config::AppConfig;
use crate::error::{CaptureError, Error, Result, SessionError, SinkError, TransmitError};
use crate::network::sink::{SessionId, Sink};
use crate::network::transmitter::{ChunkTransmitter, TransmitStats};
use crate::session::{Mode, SessionManager, StartOutcome};
use crate::ui::control::ControlSurface;
use crate::ui::handlers::{Command, ControlSurfaceAdapter};
use crate::ui::presentation::{PresentationCache, Presenter};

/// Tunables of the loop
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub buffer_bytes: usize,
    pub capture_timeout: Duration,
    pub initial_gain: GainFactor,
    pub recording_name: String,
}

impl ControllerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            buffer_bytes: config.audio.buffer_bytes,
            capture_timeout: config.audio.capture_timeout(),
            initial_gain: config.gain.factor(),
            recording_name: config.sink.recording_name.clone(),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// What the capture step of a tick did
#[derive(Debug)]
pub enum CaptureOutcome {
    /// No active session
    Idle,
    /// Capture succeeded but produced no samples
    Empty,
    /// Chunk handed to the sink
    Sent { sequence: u64, samples: usize },
    /// Transient capture failure; nothing sent
    Skipped(CaptureError),
    /// Sink refused this chunk; session stays open
    SendFailed(SinkError),
}

/// Summary of one tick
#[derive(Debug)]
pub struct TickReport {
    pub resynced: bool,
    pub opened: Option<SessionId>,
    pub closed: Option<SessionId>,
    pub open_error: Option<SessionError>,
    pub capture: CaptureOutcome,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            resynced: false,
            opened: None,
            closed: None,
            open_error: None,
            capture: CaptureOutcome::Idle,
        }
    }
}

/// Diagnostic counters for logs and tests. They never feed back into
/// session or chunk state; chunk sequence numbers live in the transmitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub ticks: u64,
    pub capture_timeouts: u64,
    pub capture_errors: u64,
    pub resyncs: u64,
}

pub struct Controller<C, K, S, P>
where
    C: CaptureSource,
    K: Sink,
    S: ControlSurface,
    P: Presenter,
{
    capture: C,
    sink: K,
    surface: S,
    presenter: P,
    sessions: SessionManager,
    transmitter: ChunkTransmitter,
    adapter: ControlSurfaceAdapter,
    cache: PresentationCache,
    gain: GainFactor,
    buffer: SampleBuffer,
    capture_timeout: Duration,
    stats: ControllerStats,
}

impl<C, K, S, P> Controller<C, K, S, P>
where
    C: CaptureSource,
    K: Sink,
    S: ControlSurface,
    P: Presenter,
{
    pub fn new(capture: C, sink: K, surface: S, presenter: P, settings: ControllerSettings) -> Result<Self> {
        let buffer = SampleBuffer::with_capacity_bytes(settings.buffer_bytes)?;
        let sessions = SessionManager::new(capture.format(), settings.recording_name);

        Ok(Self {
            capture,
            sink,
            surface,
            presenter,
            sessions,
            transmitter: ChunkTransmitter::new(),
            adapter: ControlSurfaceAdapter::new(),
            cache: PresentationCache::new(),
            gain: settings.initial_gain,
            buffer,
            capture_timeout: settings.capture_timeout,
            stats: ControllerStats::default(),
        })
    }

    /// Run one iteration of the loop.
    ///
    /// Transient problems are reported in the [`TickReport`]. An error means
    /// either the sink lost the active session ([`Error::SessionLost`], the
    /// session is already closed) or an internal invariant broke.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.stats.ticks += 1;
        let mut report = TickReport::default();

        let poll = self.surface.poll();
        let commands = self.adapter.translate(&poll, self.sink.epoch());
        for command in commands {
            if let Err(e) = self.execute(command, &mut report) {
                self.refresh_presentation();
                return Err(e);
            }
        }
        self.refresh_presentation();

        let capture = self.capture_step();
        if matches!(capture, Err(Error::SessionLost { .. })) {
            self.refresh_presentation();
        }
        report.capture = capture?;
        Ok(report)
    }

    /// Tick until `shutdown` is set. Session loss is logged and the loop
    /// keeps going; invariant failures end it.
    pub fn run(&mut self, shutdown: &AtomicBool, idle_poll: Duration) -> Result<()> {
        while !shutdown.load(Ordering::Relaxed) {
            match self.tick() {
                Ok(_) => {}
                Err(e @ Error::SessionLost { .. }) => tracing::error!("{}", e),
                Err(e) => {
                    self.stop_session();
                    return Err(e);
                }
            }

            // An active session is paced by the capture read
            if !self.sessions.is_active() {
                std::thread::sleep(idle_poll);
            }
        }

        self.stop_session();
        tracing::info!(
            "Controller stopped after {} ticks, {} chunks sent",
            self.stats.ticks,
            self.transmitter.stats().chunks_sent
        );
        Ok(())
    }

    /// Close the active session, if any
    pub fn stop_session(&mut self) -> Option<SessionId> {
        let session = self.sessions.stop()?;
        self.transmitter.unbind();
        self.presenter
            .show_status(&format!("STOPPED {} session [{}]", session.mode, session.id.get()));
        self.refresh_presentation();
        Some(session.id)
    }

    fn execute(&mut self, command: Command, report: &mut TickReport) -> Result<()> {
        match command {
            Command::Resync => {
                tracing::debug!("Connectivity changed, redrawing presentation");
                self.cache.invalidate();
                self.stats.resyncs += 1;
                report.resynced = true;
            }
            Command::SelectMode(mode) => {
                self.sessions.select_mode(mode);
            }
            Command::SetGain(gain) => {
                if gain != self.gain {
                    tracing::debug!("Gain {} -> {}", self.gain, gain);
                }
                self.gain = gain;
            }
            Command::Start => return self.start_session(report),
            Command::Stop => {
                report.closed = self.stop_session();
            }
        }
        Ok(())
    }

    fn start_session(&mut self, report: &mut TickReport) -> Result<()> {
        match self.sessions.start(&mut self.sink) {
            Ok(StartOutcome::Opened(id)) => {
                self.transmitter.bind(id);
                report.opened = Some(id);

                let activity = match self.sessions.mode() {
                    Mode::Record => "record",
                    _ => "mic",
                };
                let status = format!("STARTED {} streaming with chunk id [{}]", activity, id.get());
                match self.sink.comment(&status) {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        report.opened = None;
                        return Err(self.lose_session(id, e));
                    }
                    Err(e) => tracing::warn!("Failed to send status comment: {}", e),
                }
                self.presenter.show_status(&status);
            }
            Ok(StartOutcome::AlreadyActive(id)) => {
                tracing::debug!("Start ignored, session {} already active", id);
            }
            Ok(StartOutcome::Reserved(mode)) => {
                self.presenter
                    .show_status(&format!("{} is not available", mode.label().to_uppercase()));
            }
            Ok(StartOutcome::NoModeSelected) => {
                self.presenter.show_status("Select MIC or REC before starting");
            }
            Err(e) => {
                self.presenter.show_status(&format!("Cannot start: {}", e));
                report.open_error = Some(e);
            }
        }
        Ok(())
    }

    /// Close the session whose transport the sink reported gone
    fn lose_session(&mut self, id: SessionId, source: SinkError) -> Error {
        self.sessions.transport_lost();
        self.transmitter.unbind();
        self.presenter
            .show_status(&format!("Connection lost, session [{}] closed", id.get()));
        Error::SessionLost { session: id, source }
    }

    fn capture_step(&mut self) -> Result<CaptureOutcome> {
        let Some(session) = self.sessions.session() else {
            return Ok(CaptureOutcome::Idle);
        };
        let id = session.id;

        let bytes_read = match self.capture.read_block(self.buffer.storage_mut(), self.capture_timeout) {
            Ok(bytes) => bytes,
            Err(e) => {
                match e {
                    CaptureError::Timeout => self.stats.capture_timeouts += 1,
                    CaptureError::Device(_) => self.stats.capture_errors += 1,
                }
                tracing::debug!("Capture from {} failed: {}", self.capture.name(), e);
                return Ok(CaptureOutcome::Skipped(e));
            }
        };

        let samples = self.buffer.commit_bytes(bytes_read)?;
        if samples == 0 {
            return Ok(CaptureOutcome::Empty);
        }

        apply_gain(self.buffer.samples_mut(), self.gain);
        self.presenter.plot_waveform(self.buffer.samples());

        match self
            .transmitter
            .send(&mut self.sink, id, self.buffer.samples(), false)
        {
            Ok(sequence) => Ok(CaptureOutcome::Sent { sequence, samples }),
            Err(TransmitError::Sink(e)) if e.is_fatal() => Err(self.lose_session(id, e)),
            Err(TransmitError::Sink(e)) => {
                tracing::warn!("Chunk for session {} not delivered: {}", id, e);
                Ok(CaptureOutcome::SendFailed(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn refresh_presentation(&mut self) {
        self.cache.render(
            &mut self.presenter,
            self.sessions.mode(),
            self.sessions.is_active(),
            self.gain,
        );
    }

    pub fn mode(&self) -> Mode {
        self.sessions.mode()
    }

    pub fn gain(&self) -> GainFactor {
        self.gain
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.sessions.active_id()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn transmit_stats(&self) -> TransmitStats {
        self.transmitter.stats()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}
