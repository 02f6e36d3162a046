//! Frame-sequence playback state machine.
//!
//! [`SequencePlayer`] is a pure transition table: every request returns a
//! [`Transition`] telling the owning chart which frame to display and what to
//! do with its tick source. It never touches the store or a timer itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::signal::SignalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// At frame 0, not playing.
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerStatus::Stopped => "stopped",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// What the tick source should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Arm,
    Disarm,
    Keep,
}

/// Side effects of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Frame to put on screen, if any.
    pub display: Option<usize>,
    pub timer: TimerCommand,
    /// Whether `status` changed.
    pub status_changed: bool,
}

impl Transition {
    const NONE: Transition = Transition {
        display: None,
        timer: TimerCommand::Keep,
        status_changed: false,
    };
}

/// Playback state of one spectrum sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePlayer {
    signal: SignalId,
    frames: usize,
    current: usize,
    status: PlayerStatus,
}

impl SequencePlayer {
    pub fn new(signal: SignalId, frames: usize) -> Self {
        Self {
            signal,
            frames,
            current: 0,
            status: PlayerStatus::Stopped,
        }
    }

    pub fn signal(&self) -> SignalId {
        self.signal
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    fn last(&self) -> usize {
        self.frames.saturating_sub(1)
    }

    /// Start or resume playback from the current frame.
    pub fn play(&mut self) -> Transition {
        if self.frames == 0 || self.status == PlayerStatus::Playing {
            return Transition::NONE;
        }
        self.status = PlayerStatus::Playing;
        Transition {
            display: Some(self.current),
            timer: TimerCommand::Arm,
            status_changed: true,
        }
    }

    /// Advance one frame. At the last frame playback stops and rewinds to
    /// frame 0; there is no looping. Ignored unless playing.
    pub fn tick(&mut self) -> Transition {
        if self.status != PlayerStatus::Playing {
            return Transition::NONE;
        }
        if self.current < self.last() {
            self.current += 1;
            Transition {
                display: Some(self.current),
                timer: TimerCommand::Arm,
                status_changed: false,
            }
        } else {
            self.status = PlayerStatus::Stopped;
            self.current = 0;
            Transition {
                display: Some(0),
                timer: TimerCommand::Disarm,
                status_changed: true,
            }
        }
    }

    /// Hold the current frame.
    pub fn pause(&mut self) -> Transition {
        if self.status != PlayerStatus::Playing {
            return Transition::NONE;
        }
        self.status = PlayerStatus::Paused;
        Transition {
            display: None,
            timer: TimerCommand::Disarm,
            status_changed: true,
        }
    }

    /// Rewind to frame 0 and stop.
    pub fn stop(&mut self) -> Transition {
        if self.status == PlayerStatus::Stopped {
            return Transition::NONE;
        }
        self.status = PlayerStatus::Stopped;
        self.current = 0;
        Transition {
            display: Some(0),
            timer: TimerCommand::Disarm,
            status_changed: true,
        }
    }

    /// Jump to `index`, clamped to the available frames. The status is kept.
    pub fn seek(&mut self, index: i64) -> Transition {
        if self.frames == 0 {
            return Transition::NONE;
        }
        let last = self.last() as i64;
        self.current = index.clamp(0, last) as usize;
        Transition {
            display: Some(self.current),
            timer: TimerCommand::Keep,
            status_changed: false,
        }
    }
}
