//! HotkeyDispatcher — binds registry entries to the OS hotkey provider
//! and routes fired combinations to the executor.
//!
//! The dispatcher owns the provider: bindings are made by
//! [`activate`](HotkeyDispatcher::activate) (unregister everything, then
//! subscribe each entry) and released by
//! [`deactivate`](HotkeyDispatcher::deactivate) or on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use crate::action::ActionExecutor;
use crate::provider::{HotkeyProvider, SubscriptionId};
use crate::registry::SharedRegistry;

/// Shared "bindings are paused" flag. Nestable: paused while any
/// [`PauseGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Arc<AtomicUsize>);

impl PauseFlag {
    pub fn pause(&self) -> PauseGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        PauseGuard(Arc::clone(&self.0))
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Keeps the dispatcher paused until dropped.
#[derive(Debug)]
pub struct PauseGuard(Arc<AtomicUsize>);

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct HotkeyDispatcher<P: HotkeyProvider> {
    provider: P,
    registry: SharedRegistry,
    executor: ActionExecutor,
    active: Vec<(String, SubscriptionId)>,
    paused: PauseFlag,
}

impl<P: HotkeyProvider> HotkeyDispatcher<P> {
    pub fn new(provider: P, registry: SharedRegistry, executor: ActionExecutor) -> Self {
        Self {
            provider,
            registry,
            executor,
            active: Vec::new(),
            paused: PauseFlag::default(),
        }
    }

    /// Re-bind every registry entry. Returns how many bound.
    ///
    /// Entries that fail to subscribe are logged and skipped.
    pub fn register_all(&mut self) -> usize {
        self.unregister_all();

        let combinations = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .combinations();

        for combination in combinations {
            // Each callback owns its own copy of the combination.
            let callback = {
                let registry = Arc::clone(&self.registry);
                let executor = self.executor.clone();
                let paused = self.paused.clone();
                let combination = combination.clone();
                Box::new(move || {
                    fire(&registry, &executor, &paused, &combination);
                })
            };

            match self.provider.subscribe(&combination, callback) {
                Ok(id) => {
                    tracing::debug!(combination = %combination, "hotkey bound");
                    self.active.push((combination, id));
                }
                Err(e) => {
                    tracing::warn!(
                        combination = %combination,
                        error = %e,
                        "failed to bind hotkey, skipping"
                    );
                }
            }
        }

        tracing::info!(bound = self.active.len(), "hotkeys registered");
        self.active.len()
    }

    /// Release every active binding. Failures are ignored; the binding
    /// may already be gone.
    pub fn unregister_all(&mut self) {
        for (combination, id) in self.active.drain(..) {
            if let Err(e) = self.provider.unsubscribe(id) {
                tracing::debug!(combination = %combination, error = %e, "unsubscribe failed");
            }
        }
    }

    /// Bind all entries with the OS.
    pub fn activate(&mut self) -> usize {
        self.register_all()
    }

    /// Release all bindings with the OS.
    pub fn deactivate(&mut self) {
        self.unregister_all();
    }

    /// Combinations currently subscribed.
    pub fn active_bindings(&self) -> Vec<&str> {
        self.active.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Suppress firing without releasing the grabs.
    pub fn pause(&self) -> PauseGuard {
        self.paused.pause()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_paused()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}

impl<P: HotkeyProvider> Drop for HotkeyDispatcher<P> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

/// Handle one firing of `combination`.
///
/// Looks the action up now, not at bind time, so edits made since the
/// last registration apply. Returns whether an action ran successfully.
fn fire(
    registry: &SharedRegistry,
    executor: &ActionExecutor,
    paused: &PauseFlag,
    combination: &str,
) -> bool {
    if paused.is_paused() {
        tracing::debug!(combination, "hotkey ignored while paused");
        return false;
    }

    let action = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(combination)
        .cloned();

    match action {
        Some(action) => {
            tracing::info!(combination, kind = %action.kind(), "hotkey fired");
            executor.execute(&action)
        }
        None => {
            tracing::debug!(combination, "fired hotkey no longer bound");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionDescriptor;
    use crate::keys::Combination;
    use crate::provider::fakes::{FakeProvider, RecordingBackend};
    use crate::registry::{ConfigStore, HotkeyRegistry};
    use std::fs;
    use std::sync::RwLock;

    struct Fixture {
        _dir: tempfile::TempDir,
        backend: RecordingBackend,
        dispatcher: HotkeyDispatcher<FakeProvider>,
    }

    fn fixture(json: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");
        fs::write(&path, json).unwrap();

        let registry = Arc::new(RwLock::new(HotkeyRegistry::load(ConfigStore::new(&path))));
        let backend = RecordingBackend::default();
        let executor = ActionExecutor::new(Arc::new(backend.clone()));
        let dispatcher = HotkeyDispatcher::new(FakeProvider::default(), registry, executor);
        Fixture {
            _dir: dir,
            backend,
            dispatcher,
        }
    }

    const TWO: &str = r#"{
        "ctrl+alt+t": {"type": "type_text", "value": "hello"},
        "alt+b": {"type": "open_website", "value": "example.com"}
    }"#;

    #[test]
    fn each_binding_fires_its_own_action() {
        let mut f = fixture(TWO);
        assert_eq!(f.dispatcher.register_all(), 2);

        assert_eq!(f.dispatcher.provider().press("alt+b"), 1);
        assert_eq!(f.dispatcher.provider().press("ctrl+alt+t"), 1);
        assert_eq!(f.backend.calls(), vec!["open:example.com", "type:hello"]);
    }

    #[test]
    fn malformed_entry_does_not_block_others() {
        let mut f = fixture(
            r#"{
                "ctrl+": {"type": "type_text", "value": "bad"},
                "ctrl+g": {"type": "type_text", "value": "good"}
            }"#,
        );
        assert_eq!(f.dispatcher.register_all(), 1);
        assert_eq!(f.dispatcher.active_bindings(), vec!["ctrl+g"]);
        assert_eq!(f.dispatcher.provider().subscribed(), vec!["ctrl+g"]);
    }

    #[test]
    fn register_all_replaces_previous_bindings() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();
        f.dispatcher.register_all();
        assert_eq!(f.dispatcher.provider().subscribed(), vec!["alt+b", "ctrl+alt+t"]);
    }

    #[test]
    fn action_is_resolved_at_fire_time() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();

        let combo = Combination::parse("alt+b").unwrap();
        f.dispatcher
            .registry()
            .write()
            .unwrap()
            .add(&combo, ActionDescriptor::TypeText("edited".into()));

        f.dispatcher.provider().press("alt+b");
        assert_eq!(f.backend.calls(), vec!["type:edited"]);
    }

    #[test]
    fn removed_entry_fires_nothing() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();
        f.dispatcher.registry().write().unwrap().remove("alt+b");

        f.dispatcher.provider().press("alt+b");
        assert!(f.backend.calls().is_empty());
    }

    #[test]
    fn unregister_all_swallows_failures() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();
        f.dispatcher.provider.fail_unsubscribe = true;

        f.dispatcher.unregister_all();
        assert!(f.dispatcher.active_bindings().is_empty());
    }

    #[test]
    fn deactivate_releases_grabs() {
        let mut f = fixture(TWO);
        assert_eq!(f.dispatcher.activate(), 2);
        f.dispatcher.deactivate();
        assert!(f.dispatcher.provider().subscribed().is_empty());
    }

    #[test]
    fn paused_bindings_do_not_fire() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();

        let guard = f.dispatcher.pause();
        assert!(f.dispatcher.is_paused());
        f.dispatcher.provider().press("alt+b");
        assert!(f.backend.calls().is_empty());

        drop(guard);
        f.dispatcher.provider().press("alt+b");
        assert_eq!(f.backend.calls(), vec!["open:example.com"]);
    }

    #[test]
    fn failing_action_keeps_binding() {
        let mut f = fixture(TWO);
        f.dispatcher.register_all();
        f.backend.calls.lock().unwrap().clear();

        let failing = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        let executor = ActionExecutor::new(Arc::new(failing));
        let paused = PauseFlag::default();
        assert!(!fire(f.dispatcher.registry(), &executor, &paused, "alt+b"));
        assert_eq!(f.dispatcher.active_bindings().len(), 2);
    }
}
