//! Line-command control surface
//!
//! A reader thread parses operator lines and queues them; each poll drains
//! the queue into a single [`ControlPoll`].
//!
//! Commands: `mic`, `rec`, `play`, `start`, `stop`, `gain <position>`.

use crossbeam_channel::{bounded, Receiver, TrySendError};
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use super::control::{ControlPoll, ControlSurface};

/// Lines buffered between the reader thread and the polling loop
const INPUT_QUEUE_DEPTH: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument for {0}")]
    MissingArg(&'static str),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ControlPoll>, ConsoleError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };

    let mut poll = ControlPoll::default();
    match command.to_ascii_lowercase().as_str() {
        "mic" => poll.mic_tab = true,
        "rec" | "record" => poll.record_tab = true,
        "play" => poll.play_tab = true,
        "start" => poll.start = true,
        "stop" => poll.stop = true,
        "gain" => {
            let arg = parts.next().ok_or(ConsoleError::MissingArg("gain"))?;
            let position = arg
                .parse::<usize>()
                .map_err(|_| ConsoleError::InvalidValue(arg.to_string()))?;
            poll.gain_position = Some(position);
        }
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    }
    Ok(Some(poll))
}

pub struct ConsoleSurface {
    input_rx: Receiver<ControlPoll>,
    _reader: JoinHandle<()>,
}

impl ConsoleSurface {
    /// Start reading commands from `input` on a background thread
    pub fn spawn<R>(input: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (input_tx, input_rx) = bounded::<ControlPoll>(INPUT_QUEUE_DEPTH);

        let reader = thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                for line in input.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            tracing::warn!("Console read failed: {}", e);
                            break;
                        }
                    };

                    match parse_line(&line) {
                        Ok(Some(poll)) => match input_tx.try_send(poll) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::warn!("Console input queue full, dropping '{}'", line.trim())
                            }
                            Err(TrySendError::Disconnected(_)) => break,
                        },
                        Ok(None) => {}
                        Err(e) => tracing::warn!("{}", e),
                    }
                }
                tracing::debug!("Console input closed");
            })?;

        Ok(Self {
            input_rx,
            _reader: reader,
        })
    }
}

impl ControlSurface for ConsoleSurface {
    fn poll(&mut self) -> ControlPoll {
        let mut poll = ControlPoll::default();
        for input in self.input_rx.try_iter() {
            poll.merge(&input);
        }
        poll
    }
}
