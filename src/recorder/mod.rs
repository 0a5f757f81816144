//! Combination recorder — turns a live key-down/key-up stream into the
//! combination the user meant.
//!
//! [`ComboRecorder`] is the pure state machine. [`RecordingSession`]
//! wires one to a [`KeyEventSource`](crate::provider::KeyEventSource)
//! and owns the hooks for its lifetime.
//!
//! State transitions:
//! - key-down of a first, lone modifier is held but produces nothing,
//!   so a bare `ctrl` never counts as a combination;
//! - any other key-down recomputes the combination from the held set
//!   and, if valid, records it as the best so far (`Finished`). More
//!   key-downs may still replace it;
//! - key-up releases the key; once nothing is held and a combination
//!   exists, the recording is reported complete;
//! - `enter`/`return`/`esc`/`escape` are never captured.

pub mod session;

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::keys::normalize::{is_modifier, is_reserved, normalize};
use crate::keys::Combination;

pub use session::RecordingSession;

/// Recorder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Done: a combination was confirmed.
    Idle,
    /// Listening, nothing valid captured yet.
    Recording,
    /// A valid combination has been captured. Still listening.
    Finished,
    /// Abandoned; any capture was discarded.
    Cancelled,
}

/// Status surfaced to the UI after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderStatus {
    /// Nothing captured yet (also after `reset`).
    Waiting,
    /// Live update: the combination currently held.
    Recording(Combination),
    /// All keys released with a combination captured.
    Complete(Combination),
}

impl fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting for keys..."),
            Self::Recording(c) => write!(f, "recording: {c}"),
            Self::Complete(c) => write!(f, "recorded: {c}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("no combination recorded yet")]
    NoCombinationRecorded,
    #[error("recording session is closed")]
    Closed,
}

/// Key-combination state machine.
#[derive(Debug)]
pub struct ComboRecorder {
    state: RecorderState,
    held: BTreeSet<String>,
    best: Option<Combination>,
}

impl Default for ComboRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ComboRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Recording,
            held: BTreeSet::new(),
            best: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Best combination captured so far.
    pub fn best(&self) -> Option<&Combination> {
        self.best.as_ref()
    }

    fn is_open(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Finished)
    }

    /// Feed a key-down with its raw name.
    pub fn key_down(&mut self, raw: &str) -> Option<RecorderStatus> {
        if !self.is_open() {
            return None;
        }
        let token = normalize(raw);
        if is_reserved(&token) {
            return None;
        }

        if is_modifier(&token) && self.held.is_empty() {
            self.held.insert(token);
            return None;
        }

        self.held.insert(token);
        let combo = Combination::from_tokens(self.held.iter().map(String::as_str))?;
        self.best = Some(combo.clone());
        self.state = RecorderState::Finished;
        Some(RecorderStatus::Recording(combo))
    }

    /// Feed a key-up with its raw name.
    pub fn key_up(&mut self, raw: &str) -> Option<RecorderStatus> {
        if !self.is_open() {
            return None;
        }
        let token = normalize(raw);
        if is_reserved(&token) {
            return None;
        }

        self.held.remove(&token);
        match &self.best {
            Some(best) if self.held.is_empty() => Some(RecorderStatus::Complete(best.clone())),
            _ => None,
        }
    }

    /// Clear everything and start over.
    pub fn reset(&mut self) -> RecorderStatus {
        self.held.clear();
        self.best = None;
        self.state = RecorderState::Recording;
        RecorderStatus::Waiting
    }

    /// Accept the best combination. Leaves the recorder open if there
    /// is none.
    pub fn confirm(&mut self) -> Result<Combination, RecordError> {
        if !self.is_open() {
            return Err(RecordError::Closed);
        }
        let combo = self.best.take().ok_or(RecordError::NoCombinationRecorded)?;
        self.held.clear();
        self.state = RecorderState::Idle;
        Ok(combo)
    }

    /// Abandon the recording.
    pub fn cancel(&mut self) {
        self.held.clear();
        self.best = None;
        self.state = RecorderState::Cancelled;
    }
}
