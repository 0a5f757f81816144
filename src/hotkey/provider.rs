//! X11 implementations of the OS-facing traits.
//!
//! Neither type reads the connection itself. The owner runs
//! [`spawn_event_thread`](super::x11::spawn_event_thread) and hands
//! each [`RawKeyEvent`] to [`X11HotkeyProvider::dispatch`] or
//! [`X11KeySource::deliver`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::keybinding::{Binding, keysym_name};
use super::x11::{RawKeyEvent, X11Context};
use crate::provider::{
    FireCallback, HookId, HotkeyProvider, KeyEventSource, KeyHandler, ProviderError,
    SubscriptionId,
};

struct Grab {
    bindings: Vec<Binding>,
    callback: FireCallback,
}

impl Grab {
    fn matches(&self, event: &RawKeyEvent) -> bool {
        self.bindings
            .iter()
            .any(|b| b.matches(event.keycode, event.state))
    }
}

/// Global hotkeys as passive key grabs on the root window.
pub struct X11HotkeyProvider {
    ctx: Arc<X11Context>,
    next_id: u64,
    grabs: HashMap<u64, Grab>,
}

impl X11HotkeyProvider {
    pub fn new(ctx: Arc<X11Context>) -> Self {
        Self {
            ctx,
            next_id: 0,
            grabs: HashMap::new(),
        }
    }

    fn release(&self, bindings: &[Binding]) {
        for binding in bindings {
            self.ctx.ungrab_key(binding);
        }
    }

    /// Run the callback of every grab matching a key press. Returns
    /// whether any matched.
    pub fn dispatch(&self, event: &RawKeyEvent) -> bool {
        if !event.pressed {
            return false;
        }

        let mut matched = false;
        for grab in self.grabs.values() {
            if grab.matches(event) {
                (grab.callback)();
                matched = true;
            }
        }
        matched
    }
}

impl HotkeyProvider for X11HotkeyProvider {
    fn subscribe(
        &mut self,
        combination: &str,
        callback: FireCallback,
    ) -> Result<SubscriptionId, ProviderError> {
        let bindings = Binding::resolve(combination, &self.ctx.keymap())?;

        for (i, binding) in bindings.iter().enumerate() {
            let granted = self.ctx.grab_key(binding).inspect_err(|_| {
                self.release(&bindings[..=i]);
            })?;
            if !granted {
                // Drop whichever grabs and lock variants did succeed.
                self.release(&bindings[..=i]);
                return Err(ProviderError::Conflict(binding.raw.clone()));
            }
        }

        self.next_id += 1;
        self.grabs.insert(self.next_id, Grab { bindings, callback });
        Ok(SubscriptionId(self.next_id))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), ProviderError> {
        let grab = self
            .grabs
            .remove(&id.0)
            .ok_or(ProviderError::UnknownHandle(id.0))?;
        self.release(&grab.bindings);
        Ok(())
    }
}

impl Drop for X11HotkeyProvider {
    fn drop(&mut self) {
        for grab in self.grabs.values() {
            self.release(&grab.bindings);
        }
    }
}

#[derive(Default)]
struct Hooks {
    down: Vec<(HookId, KeyHandler)>,
    up: Vec<(HookId, KeyHandler)>,
}

impl Hooks {
    fn is_empty(&self) -> bool {
        self.down.is_empty() && self.up.is_empty()
    }
}

/// Raw key stream via an active keyboard grab.
///
/// The grab is taken when the first handler is installed and released
/// when the last one is removed.
pub struct X11KeySource {
    ctx: Arc<X11Context>,
    next_id: AtomicU64,
    hooks: Mutex<Hooks>,
}

impl X11KeySource {
    pub fn new(ctx: Arc<X11Context>) -> Self {
        Self {
            ctx,
            next_id: AtomicU64::new(0),
            hooks: Mutex::new(Hooks::default()),
        }
    }

    fn hooks(&self) -> MutexGuard<'_, Hooks> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw key name of an event's key, if it has one.
    pub fn key_name(&self, event: &RawKeyEvent) -> Option<String> {
        let keysym = self.ctx.keymap().keysym(event.keycode)?;
        let name = keysym_name(keysym);
        if name.is_none() {
            tracing::debug!(keycode = event.keycode, keysym, "key has no name, ignored");
        }
        name
    }

    /// Hand a raw key name to every handler for that direction.
    pub fn deliver(&self, pressed: bool, name: &str) {
        // Clone out so a handler may unhook without deadlocking.
        let handlers: Vec<KeyHandler> = {
            let hooks = self.hooks();
            let list = if pressed { &hooks.down } else { &hooks.up };
            list.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in handlers {
            handler(name);
        }
    }

    fn install(&self, pressed: bool, handler: KeyHandler) -> Result<HookId, ProviderError> {
        let mut hooks = self.hooks();
        if hooks.is_empty() {
            self.ctx.grab_keyboard()?;
            tracing::debug!("keyboard grabbed");
        }

        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if pressed {
            hooks.down.push((id, handler));
        } else {
            hooks.up.push((id, handler));
        }
        Ok(id)
    }
}

impl KeyEventSource for X11KeySource {
    fn on_key_down(&self, handler: KeyHandler) -> Result<HookId, ProviderError> {
        self.install(true, handler)
    }

    fn on_key_up(&self, handler: KeyHandler) -> Result<HookId, ProviderError> {
        self.install(false, handler)
    }

    fn unhook(&self, id: HookId) {
        let mut hooks = self.hooks();
        if hooks.is_empty() {
            return;
        }
        hooks.down.retain(|(h, _)| *h != id);
        hooks.up.retain(|(h, _)| *h != id);
        if hooks.is_empty() {
            self.ctx.ungrab_keyboard();
            tracing::debug!("keyboard released");
        }
    }
}

impl Drop for X11KeySource {
    fn drop(&mut self) {
        if !self.hooks().is_empty() {
            self.ctx.ungrab_keyboard();
        }
    }
}
