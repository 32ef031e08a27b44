//! Operator-selected mode

use std::fmt;

use crate::network::sink::SessionKind;

/// High-level activity chosen on the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Nothing selected yet
    #[default]
    None,
    /// Live monitoring: stream captured audio to the sink for playback
    MicMonitor,
    /// Stream captured audio to the sink to be saved
    Record,
    /// Selectable but has no audio path
    Play,
}

impl Mode {
    /// Transfer kind a session in this mode opens, if the mode opens one at all
    pub fn session_kind(self) -> Option<SessionKind> {
        match self {
            Mode::MicMonitor => Some(SessionKind::Stream),
            Mode::Record => Some(SessionKind::Record),
            Mode::None | Mode::Play => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::MicMonitor => "mic",
            Mode::Record => "record",
            Mode::Play => "play",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_capture_modes_open_sessions() {
        assert_eq!(Mode::MicMonitor.session_kind(), Some(SessionKind::Stream));
        assert_eq!(Mode::Record.session_kind(), Some(SessionKind::Record));
        assert_eq!(Mode::Play.session_kind(), None);
        assert_eq!(Mode::None.session_kind(), None);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(Mode::default(), Mode::None);
        assert_eq!(Mode::default().to_string(), "none");
    }
}
