//! Control surface adapter
//!
//! Maps one poll of the surface to the ordered list of state-machine calls
//! the controller performs this tick. No decisions are made here beyond the
//! mapping itself.

use crate::audio::gain::GainFactor;
use crate::network::sink::ConnectivityEpoch;
use crate::session::Mode;

use super::control::{ControlPoll, EpochTracker};

/// A call on the session manager or gain stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Redraw cached presentation; touches no state
    Resync,
    SelectMode(Mode),
    SetGain(GainFactor),
    Start,
    Stop,
}

#[derive(Debug, Default)]
pub struct ControlSurfaceAdapter {
    epoch: EpochTracker,
}

impl ControlSurfaceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands for this tick, in execution order: resync, mode, gain, start, stop
    pub fn translate(&mut self, poll: &ControlPoll, epoch: ConnectivityEpoch) -> Vec<Command> {
        let mut commands = Vec::with_capacity(5);

        if self.epoch.check_changed(epoch) {
            commands.push(Command::Resync);
        }
        if let Some(tab) = poll.selected_tab() {
            commands.push(Command::SelectMode(tab.mode()));
        }
        if let Some(position) = poll.gain_position {
            commands.push(Command::SetGain(GainFactor::from_meter_position(position)));
        }
        if poll.start {
            commands.push(Command::Start);
        }
        if poll.stop {
            commands.push(Command::Stop);
        }

        commands
    }
}
