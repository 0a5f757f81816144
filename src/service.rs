//! HotkeyService — the operations a front end drives.
//!
//! Wraps the shared registry and the dispatcher. Mutations persist
//! immediately; new bindings take effect on the next
//! [`re_register_all`](HotkeyService::re_register_all).

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc::UnboundedSender;

use crate::action::{ActionDescriptor, ActionExecutor, ActionKind};
use crate::dispatch::HotkeyDispatcher;
use crate::provider::{HotkeyProvider, KeyEventSource, ProviderError};
use crate::recorder::{RecorderStatus, RecordingSession};
use crate::registry::{HotkeyRegistry, SharedRegistry};

pub struct HotkeyService<P: HotkeyProvider> {
    registry: SharedRegistry,
    dispatcher: HotkeyDispatcher<P>,
}

impl<P: HotkeyProvider> HotkeyService<P> {
    /// Build the service. Nothing is bound until
    /// [`re_register_all`](Self::re_register_all).
    pub fn new(registry: HotkeyRegistry, provider: P, executor: ActionExecutor) -> Self {
        let registry = Arc::new(RwLock::new(registry));
        let dispatcher = HotkeyDispatcher::new(provider, Arc::clone(&registry), executor);
        Self {
            registry,
            dispatcher,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HotkeyRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HotkeyRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list_entries(&self) -> Vec<(String, ActionDescriptor)> {
        self.read().list()
    }

    /// Whether `combination` is already bound, so a front end can ask
    /// before overwriting.
    pub fn contains(&self, combination: &str) -> bool {
        self.read().contains(combination)
    }

    pub fn add_entry(&self, combination: &str, kind: ActionKind, value: &str) -> bool {
        self.write().add_entry(combination, kind, value)
    }

    pub fn remove_entry(&self, combination: &str) -> bool {
        self.write().remove(combination)
    }

    /// Rebind everything from the in-memory registry.
    pub fn re_register_all(&mut self) -> usize {
        self.dispatcher.register_all()
    }

    /// Re-read the shortcuts file, then rebind.
    pub fn reload(&mut self) -> usize {
        self.write().reload();
        self.dispatcher.register_all()
    }

    /// Open a recording session on `source`.
    ///
    /// Bindings stay paused until the session is confirmed, cancelled,
    /// or dropped, so a chord meant for the recorder cannot fire an
    /// action.
    pub fn start_recording<'s, S: KeyEventSource>(
        &self,
        source: &'s S,
        status: UnboundedSender<RecorderStatus>,
    ) -> Result<RecordingSession<'s, S>, ProviderError> {
        RecordingSession::start(source, status, Some(self.dispatcher.pause()))
    }

    pub fn dispatcher(&self) -> &HotkeyDispatcher<P> {
        &self.dispatcher
    }

    /// Release all bindings.
    pub fn shutdown(&mut self) {
        self.dispatcher.deactivate();
    }
}
