//! Mode and session state machine
//!
//! ```text
//!            select_mode(m)              start() [mic|record]
//!   Idle ─────────────────▶ ModeSelected ─────────────────────▶ Active
//!     ▲   select_mode(None)  │  ▲   ▲                            │
//!     └──────────────────────┘  │   └──── stop() / transport lost ┘
//!                               └─ select_mode(m')
//! ```
//!
//! The mode is locked while a session is active, so an active session's mode
//! can never disagree with the selected mode.

use crate::audio::capture::StreamFormat;
use crate::error::SessionError;
use crate::network::sink::{OpenRequest, SessionId, SessionKind, Sink};

use super::mode::Mode;

/// An open transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub mode: Mode,
    pub format: StreamFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No mode selected, no session
    Idle,
    /// Mode chosen, no session yet
    ModeSelected(Mode),
    /// Session open; mode locked
    Active(Session),
}

/// Result of a mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Selected(Mode),
    Unchanged,
    /// Refused because a session is active in `active`
    Locked { active: Mode },
}

/// Result of a start request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Opened(SessionId),
    /// A session was already open; nothing happened
    AlreadyActive(SessionId),
    /// The mode has no audio path (Play)
    Reserved(Mode),
    NoModeSelected,
}

pub struct SessionManager {
    state: SessionState,
    format: StreamFormat,
    recording_name: String,
}

impl SessionManager {
    pub fn new(format: StreamFormat, recording_name: impl Into<String>) -> Self {
        Self {
            state: SessionState::Idle,
            format,
            recording_name: recording_name.into(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Currently selected mode
    pub fn mode(&self) -> Mode {
        match &self.state {
            SessionState::Idle => Mode::None,
            SessionState::ModeSelected(mode) => *mode,
            SessionState::Active(session) => session.mode,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.session().map(|s| s.id)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Choose a mode. Has no effect while a session is active.
    pub fn select_mode(&mut self, mode: Mode) -> ModeChange {
        if let SessionState::Active(session) = &self.state {
            return ModeChange::Locked {
                active: session.mode,
            };
        }
        if self.mode() == mode {
            return ModeChange::Unchanged;
        }

        self.state = match mode {
            Mode::None => SessionState::Idle,
            mode => SessionState::ModeSelected(mode),
        };
        tracing::debug!("Mode selected: {}", mode);
        ModeChange::Selected(mode)
    }

    /// Open a session for the selected mode.
    ///
    /// Idempotent while a session is active. A rejected open leaves the
    /// manager in `ModeSelected`.
    pub fn start<K: Sink + ?Sized>(&mut self, sink: &mut K) -> Result<StartOutcome, SessionError> {
        let mode = match &self.state {
            SessionState::Active(session) => return Ok(StartOutcome::AlreadyActive(session.id)),
            SessionState::Idle => return Ok(StartOutcome::NoModeSelected),
            SessionState::ModeSelected(mode) => *mode,
        };

        let Some(kind) = mode.session_kind() else {
            return Ok(StartOutcome::Reserved(mode));
        };

        let request = OpenRequest {
            kind,
            format: self.format,
            name: (kind == SessionKind::Record).then(|| self.recording_name.clone()),
        };

        match sink.open_session(&request) {
            Ok(id) => {
                tracing::info!(
                    "Opened {} session {} ({} Hz, {} ch)",
                    mode,
                    id,
                    self.format.sample_rate,
                    self.format.channels
                );
                self.state = SessionState::Active(Session {
                    id,
                    mode,
                    format: self.format,
                });
                Ok(StartOutcome::Opened(id))
            }
            Err(source) => {
                tracing::warn!("Sink rejected {} session: {}", mode, source);
                Err(SessionError::OpenRejected { mode, source })
            }
        }
    }

    /// Close the active session, keeping its mode selected.
    /// Returns the closed session, or `None` if nothing was active.
    pub fn stop(&mut self) -> Option<Session> {
        let session = self.close()?;
        tracing::info!("Closed {} session {}", session.mode, session.id);
        Some(session)
    }

    /// The sink lost the transport under the active session
    pub fn transport_lost(&mut self) -> Option<Session> {
        let session = self.close()?;
        tracing::error!("Lost {} session {}", session.mode, session.id);
        Some(session)
    }

    fn close(&mut self) -> Option<Session> {
        let mode = self.session()?.mode;
        match std::mem::replace(&mut self.state, SessionState::ModeSelected(mode)) {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }
}
