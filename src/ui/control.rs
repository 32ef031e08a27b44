//! Control surface boundary
//!
//! The surface is polled once per tick. Every element reports whether it was
//! touched since the previous poll; the gain meter reports the cell selected.

use crate::network::sink::ConnectivityEpoch;
use crate::session::Mode;

/// Mode tabs on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Mic,
    Record,
    Play,
}

impl Tab {
    pub fn mode(self) -> Mode {
        match self {
            Tab::Mic => Mode::MicMonitor,
            Tab::Record => Mode::Record,
            Tab::Play => Mode::Play,
        }
    }
}

/// Interactions observed in one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPoll {
    pub mic_tab: bool,
    pub record_tab: bool,
    pub play_tab: bool,
    pub start: bool,
    pub stop: bool,
    /// Gain meter cell selected, counted from 0
    pub gain_position: Option<usize>,
}

impl ControlPoll {
    /// Tab touched this poll; Mic wins over Record, Record over Play
    pub fn selected_tab(&self) -> Option<Tab> {
        if self.mic_tab {
            Some(Tab::Mic)
        } else if self.record_tab {
            Some(Tab::Record)
        } else if self.play_tab {
            Some(Tab::Play)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ControlPoll::default()
    }

    /// Fold a later poll into this one
    pub fn merge(&mut self, other: &ControlPoll) {
        self.mic_tab |= other.mic_tab;
        self.record_tab |= other.record_tab;
        self.play_tab |= other.play_tab;
        self.start |= other.start;
        self.stop |= other.stop;
        if other.gain_position.is_some() {
            self.gain_position = other.gain_position;
        }
    }
}

/// Source of operator input
pub trait ControlSurface {
    /// Interactions since the previous call
    fn poll(&mut self) -> ControlPoll;
}

impl<T: ControlSurface + ?Sized> ControlSurface for Box<T> {
    fn poll(&mut self) -> ControlPoll {
        (**self).poll()
    }
}

/// Detects connectivity epoch changes. The first observation always counts
/// as a change so the presentation gets drawn once at startup.
#[derive(Debug, Default)]
pub struct EpochTracker {
    last: Option<ConnectivityEpoch>,
}

impl EpochTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_changed(&mut self, current: ConnectivityEpoch) -> bool {
        if self.last == Some(current) {
            return false;
        }
        self.last = Some(current);
        true
    }
}
