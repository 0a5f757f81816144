//! Recording session — a [`ComboRecorder`] attached to a live key stream.
//!
//! The session installs one key-down and one key-up hook on start and
//! removes both when it is confirmed, cancelled, or dropped, so a
//! session can never leak a global hook. Status updates are sent on a
//! channel for the UI side to render; handlers never touch UI state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use super::{ComboRecorder, RecordError, RecorderState, RecorderStatus};
use crate::dispatch::PauseGuard;
use crate::keys::Combination;
use crate::provider::{HookId, KeyEventSource, KeyHandler, ProviderError};

pub struct RecordingSession<'s, S: KeyEventSource> {
    source: &'s S,
    recorder: Arc<Mutex<ComboRecorder>>,
    status: UnboundedSender<RecorderStatus>,
    hooks: Vec<HookId>,
    pause: Option<PauseGuard>,
}

fn lock(recorder: &Mutex<ComboRecorder>) -> MutexGuard<'_, ComboRecorder> {
    recorder.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'s, S: KeyEventSource> RecordingSession<'s, S> {
    /// Open a session on `source`.
    ///
    /// `pause` keeps the dispatcher's bindings quiet until the session
    /// detaches. Only one session may be open per source.
    pub fn start(
        source: &'s S,
        status: UnboundedSender<RecorderStatus>,
        pause: Option<PauseGuard>,
    ) -> Result<Self, ProviderError> {
        let mut session = Self {
            source,
            recorder: Arc::new(Mutex::new(ComboRecorder::new())),
            status,
            hooks: Vec::with_capacity(2),
            pause,
        };

        // Early return drops the session, which unhooks whatever was
        // already installed.
        let down = session.handler(ComboRecorder::key_down);
        session.hooks.push(source.on_key_down(down)?);
        let up = session.handler(ComboRecorder::key_up);
        session.hooks.push(source.on_key_up(up)?);

        let _ = session.status.send(RecorderStatus::Waiting);
        tracing::debug!("recording session started");
        Ok(session)
    }

    fn handler(
        &self,
        event: fn(&mut ComboRecorder, &str) -> Option<RecorderStatus>,
    ) -> KeyHandler {
        let recorder = Arc::clone(&self.recorder);
        let status = self.status.clone();
        Arc::new(move |raw: &str| {
            let update = event(&mut *lock(&recorder), raw);
            if let Some(update) = update {
                let _ = status.send(update);
            }
        })
    }

    pub fn state(&self) -> RecorderState {
        lock(&self.recorder).state()
    }

    pub fn best(&self) -> Option<Combination> {
        lock(&self.recorder).best().cloned()
    }

    /// Whether the key hooks are still installed.
    pub fn is_attached(&self) -> bool {
        !self.hooks.is_empty()
    }

    /// Discard the capture and keep recording.
    pub fn reset(&mut self) {
        let update = lock(&self.recorder).reset();
        let _ = self.status.send(update);
    }

    /// Finish with the best combination and detach.
    ///
    /// With nothing recorded this fails and the session stays open.
    pub fn confirm(&mut self) -> Result<Combination, RecordError> {
        let combo = lock(&self.recorder).confirm()?;
        self.detach();
        tracing::debug!(combination = %combo, "recording confirmed");
        Ok(combo)
    }

    /// Abandon the recording and detach before returning.
    pub fn cancel(&mut self) {
        lock(&self.recorder).cancel();
        self.detach();
        tracing::debug!("recording cancelled");
    }

    fn detach(&mut self) {
        for id in self.hooks.drain(..) {
            self.source.unhook(id);
        }
        self.pause.take();
    }
}

impl<S: KeyEventSource> Drop for RecordingSession<'_, S> {
    fn drop(&mut self) {
        if self.is_attached() {
            lock(&self.recorder).cancel();
            self.detach();
        }
    }
}
