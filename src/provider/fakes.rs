//! In-memory providers for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    FireCallback, HookId, HotkeyProvider, KeyEventSource, KeyHandler, ProviderError,
    SubscriptionId,
};
use crate::action::sink::{ActionBackend, ExecutionError};
use crate::keys::Combination;

/// Hotkey provider that accepts any parseable combination.
#[derive(Default)]
pub struct FakeProvider {
    next: u64,
    subs: HashMap<u64, (String, FireCallback)>,
    pub fail_unsubscribe: bool,
}

impl FakeProvider {
    /// Fire every subscription for `combination`. Returns how many ran.
    pub fn press(&self, combination: &str) -> usize {
        let mut fired = 0;
        for (combo, callback) in self.subs.values() {
            if combo == combination {
                callback();
                fired += 1;
            }
        }
        fired
    }

    pub fn subscribed(&self) -> Vec<String> {
        let mut combos: Vec<String> = self.subs.values().map(|(c, _)| c.clone()).collect();
        combos.sort();
        combos
    }
}

impl HotkeyProvider for FakeProvider {
    fn subscribe(
        &mut self,
        combination: &str,
        callback: FireCallback,
    ) -> Result<SubscriptionId, ProviderError> {
        Combination::parse(combination)
            .map_err(|_| ProviderError::Parse(combination.to_string()))?;
        self.next += 1;
        self.subs.insert(self.next, (combination.to_string(), callback));
        Ok(SubscriptionId(self.next))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), ProviderError> {
        let removed = self.subs.remove(&id.0);
        if self.fail_unsubscribe || removed.is_none() {
            return Err(ProviderError::UnknownHandle(id.0));
        }
        Ok(())
    }
}

/// Key source driven by hand.
#[derive(Default)]
pub struct FakeKeySource {
    next: AtomicU64,
    hooks: Mutex<Vec<(HookId, bool, KeyHandler)>>,
}

impl FakeKeySource {
    pub fn down(&self, name: &str) {
        self.emit(true, name);
    }

    pub fn up(&self, name: &str) {
        self.emit(false, name);
    }

    /// Press all `names` in order, then release them in reverse.
    pub fn chord(&self, names: &[&str]) {
        for name in names {
            self.down(name);
        }
        for name in names.iter().rev() {
            self.up(name);
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.lock().unwrap().len()
    }

    fn emit(&self, is_down: bool, name: &str) {
        let handlers: Vec<KeyHandler> = self
            .hooks
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, down, _)| *down == is_down)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(name);
        }
    }

    fn install(&self, is_down: bool, handler: KeyHandler) -> HookId {
        let id = HookId(self.next.fetch_add(1, Ordering::Relaxed));
        self.hooks.lock().unwrap().push((id, is_down, handler));
        id
    }
}

impl KeyEventSource for FakeKeySource {
    fn on_key_down(&self, handler: KeyHandler) -> Result<HookId, ProviderError> {
        Ok(self.install(true, handler))
    }

    fn on_key_up(&self, handler: KeyHandler) -> Result<HookId, ProviderError> {
        Ok(self.install(false, handler))
    }

    fn unhook(&self, id: HookId) {
        self.hooks.lock().unwrap().retain(|(h, _, _)| *h != id);
    }
}

/// Action backend that records calls instead of touching the OS.
#[derive(Default, Clone)]
pub struct RecordingBackend {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ExecutionError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail {
            return Err(ExecutionError::Spawn {
                program: call,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(())
    }
}

impl ActionBackend for RecordingBackend {
    fn launch_app(&self, path: &str) -> Result<(), ExecutionError> {
        self.record(format!("launch:{path}"))
    }

    fn open_url(&self, url: &str) -> Result<(), ExecutionError> {
        self.record(format!("open:{url}"))
    }

    fn type_text(&self, text: &str) -> Result<(), ExecutionError> {
        self.record(format!("type:{text}"))
    }
}
