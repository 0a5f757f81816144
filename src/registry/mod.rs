//! HotkeyRegistry — combination → action mapping, persisted on every
//! mutation.
//!
//! Keys are canonical combination strings. Entries loaded from disk are
//! kept verbatim even if they do not parse; the dispatcher skips those
//! at registration time.
//!
//! No internal locking: share it as [`SharedRegistry`] and take the
//! write lock for `add`/`remove`.

pub mod store;

use std::sync::{Arc, RwLock};

use crate::action::{ActionDescriptor, ActionKind};
use crate::keys::Combination;

pub use store::{ConfigError, ConfigStore, Entries};

/// Registry shared between the UI side and hotkey callbacks.
pub type SharedRegistry = Arc<RwLock<HotkeyRegistry>>;

pub struct HotkeyRegistry {
    store: ConfigStore,
    entries: Entries,
    /// The file exists but could not be read. It is backed up before
    /// the next save replaces it.
    load_failed: bool,
}

impl HotkeyRegistry {
    /// Load from `store`. Missing or corrupt storage yields an empty
    /// registry; corruption is logged.
    pub fn load(store: ConfigStore) -> Self {
        let mut registry = Self {
            store,
            entries: Entries::new(),
            load_failed: false,
        };
        registry.reload();
        registry
    }

    /// Re-read the store, replacing all entries.
    pub fn reload(&mut self) {
        self.load_failed = false;
        self.entries = match self.store.load() {
            Ok(entries) => {
                tracing::debug!(
                    path = %self.store.path().display(),
                    count = entries.len(),
                    "loaded shortcuts"
                );
                entries
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load shortcuts, starting empty");
                self.load_failed = true;
                Entries::new()
            }
        };
    }

    /// Whether the last load hit an unreadable file.
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Persist all entries. Failure is logged and returned as `false`.
    ///
    /// After a failed load the old file is first copied to `<path>.bak`;
    /// if that copy fails nothing is written.
    pub fn save(&mut self) -> bool {
        if self.load_failed {
            match self.store.back_up() {
                Ok(Some(backup)) => tracing::warn!(
                    backup = %backup.display(),
                    "kept unreadable shortcuts file"
                ),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "refusing to overwrite unreadable shortcuts file");
                    return false;
                }
            }
            self.load_failed = false;
        }

        match self.store.save(&self.entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to save shortcuts");
                false
            }
        }
    }

    /// Insert or silently overwrite `combination`, then persist.
    ///
    /// Returns whether persistence succeeded; on failure the entries are
    /// left as they were. Asking the user before an overwrite is the
    /// caller's job.
    pub fn add(&mut self, combination: &Combination, action: ActionDescriptor) -> bool {
        let key = combination.to_string();
        let previous = self.entries.insert(key.clone(), action);
        if self.save() {
            return true;
        }

        match previous {
            Some(previous) => {
                self.entries.insert(key, previous);
            }
            None => {
                self.entries.shift_remove(&key);
            }
        }
        false
    }

    /// Remove `combination` and persist. `false` if it was not bound or
    /// the save failed, in which case the entry stays.
    pub fn remove(&mut self, combination: &str) -> bool {
        let Some(key) = self.resolve_key(combination) else {
            return false;
        };
        let Some((index, key, action)) = self.entries.shift_remove_full(&key) else {
            return false;
        };
        if self.save() {
            return true;
        }

        self.entries.shift_insert(index, key, action);
        false
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<(String, ActionDescriptor)> {
        self.entries
            .iter()
            .map(|(combo, action)| (combo.clone(), action.clone()))
            .collect()
    }

    pub fn get(&self, combination: &str) -> Option<&ActionDescriptor> {
        self.entries.get(combination)
    }

    pub fn contains(&self, combination: &str) -> bool {
        self.resolve_key(combination).is_some()
    }

    /// Bound combination strings in insertion order.
    pub fn combinations(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Validate raw form input and add it.
    ///
    /// `false` if the combination or value is rejected, or the save
    /// failed.
    pub fn add_entry(&mut self, combination: &str, kind: ActionKind, value: &str) -> bool {
        let combo = match Combination::parse(combination) {
            Ok(combo) => combo,
            Err(e) => {
                tracing::warn!(combination, error = %e, "rejected combination");
                return false;
            }
        };
        let action = match ActionDescriptor::new(kind, value) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(combination = %combo, error = %e, "rejected action");
                return false;
            }
        };
        self.add(&combo, action)
    }

    /// Find the stored key for `combination`: its canonical form first,
    /// then the string as written.
    fn resolve_key(&self, combination: &str) -> Option<String> {
        if let Ok(combo) = Combination::parse(combination) {
            let canonical = combo.to_string();
            if self.entries.contains_key(&canonical) {
                return Some(canonical);
            }
        }
        let raw = combination.trim();
        self.entries.contains_key(raw).then(|| raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_registry() -> (tempfile::TempDir, HotkeyRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("shortcuts.json"));
        (dir, HotkeyRegistry::load(store))
    }

    fn combo(s: &str) -> Combination {
        Combination::parse(s).unwrap()
    }

    #[test]
    fn add_then_list() {
        let (_dir, mut registry) = temp_registry();
        assert!(registry.add(&combo("ctrl+alt+t"), ActionDescriptor::TypeText("hello".into())));

        let entries = registry.list();
        assert_eq!(entries.len(), 1);
        let (combination, action) = &entries[0];
        assert_eq!(combination, "ctrl+alt+t");
        assert_eq!(action.kind().as_str(), "type_text");
        assert_eq!(action.value(), "hello");
    }

    #[test]
    fn add_persists_and_reloads() {
        let (_dir, mut registry) = temp_registry();
        registry.add(&combo("alt+b"), ActionDescriptor::OpenUrl("example.com".into()));
        registry.add(&combo("ctrl+e"), ActionDescriptor::LaunchApp("/usr/bin/gedit".into()));

        let reloaded = HotkeyRegistry::load(registry.store().clone());
        assert_eq!(reloaded.list(), registry.list());
    }

    #[test]
    fn add_overwrites_silently_in_place() {
        let (_dir, mut registry) = temp_registry();
        registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("one".into()));
        registry.add(&combo("ctrl+b"), ActionDescriptor::TypeText("two".into()));
        registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("three".into()));

        assert_eq!(registry.combinations(), vec!["ctrl+a", "ctrl+b"]);
        assert_eq!(registry.get("ctrl+a"), Some(&ActionDescriptor::TypeText("three".into())));
    }

    #[test]
    fn remove_absent_is_noop() {
        let (_dir, mut registry) = temp_registry();
        registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("x".into()));
        let before = registry.list();

        assert!(!registry.remove("ctrl+z"));
        assert_eq!(registry.list(), before);
    }

    #[test]
    fn remove_accepts_non_canonical_spelling() {
        let (_dir, mut registry) = temp_registry();
        registry.add(&combo("ctrl+shift+k"), ActionDescriptor::TypeText("x".into()));

        assert!(registry.remove("Shift+Ctrl+K"));
        assert!(registry.is_empty());
        assert!(HotkeyRegistry::load(registry.store().clone()).is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");
        fs::write(&path, "[1, 2").unwrap();

        let registry = HotkeyRegistry::load(ConfigStore::new(&path));
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_keys_are_kept_and_removable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");
        fs::write(
            &path,
            r#"{"ctrl+": {"type": "type_text", "value": "x"}}"#,
        )
        .unwrap();

        let mut registry = HotkeyRegistry::load(ConfigStore::new(&path));
        assert_eq!(registry.combinations(), vec!["ctrl+"]);
        assert!(registry.remove("ctrl+"));
    }

    #[test]
    fn save_failure_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let mut registry = HotkeyRegistry::load(ConfigStore::new(blocker.join("s.json")));
        assert!(!registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("x".into())));
        assert!(registry.is_empty());
    }

    /// Three entries, then the store's directory is replaced by a file
    /// so every later save fails.
    fn unwritable_registry() -> (tempfile::TempDir, HotkeyRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("conf");
        let mut registry = HotkeyRegistry::load(ConfigStore::new(conf.join("shortcuts.json")));
        registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("one".into()));
        registry.add(&combo("ctrl+b"), ActionDescriptor::TypeText("two".into()));
        registry.add(&combo("ctrl+c"), ActionDescriptor::TypeText("three".into()));

        fs::remove_dir_all(&conf).unwrap();
        fs::write(&conf, "").unwrap();
        (dir, registry)
    }

    #[test]
    fn failed_add_leaves_entries_unchanged() {
        let (_dir, mut registry) = unwritable_registry();
        let before = registry.list();

        assert!(!registry.add(&combo("ctrl+d"), ActionDescriptor::TypeText("new".into())));
        assert!(!registry.add(&combo("ctrl+b"), ActionDescriptor::TypeText("changed".into())));
        assert_eq!(registry.list(), before);
    }

    #[test]
    fn failed_remove_keeps_entry_in_place() {
        let (_dir, mut registry) = unwritable_registry();
        let before = registry.list();

        assert!(!registry.remove("ctrl+b"));
        assert_eq!(registry.list(), before);
    }

    #[test]
    fn unreadable_file_is_backed_up_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");
        fs::write(&path, "{ \"ctrl+a\": oops").unwrap();

        let mut registry = HotkeyRegistry::load(ConfigStore::new(&path));
        assert!(registry.load_failed());

        assert!(registry.add(&combo("ctrl+b"), ActionDescriptor::TypeText("x".into())));
        assert!(!registry.load_failed());
        assert_eq!(
            fs::read_to_string(dir.path().join("shortcuts.json.bak")).unwrap(),
            "{ \"ctrl+a\": oops"
        );
        assert_eq!(HotkeyRegistry::load(registry.store().clone()).combinations(), vec!["ctrl+b"]);
    }

    #[test]
    fn readable_file_is_not_backed_up() {
        let (dir, mut registry) = temp_registry();
        registry.add(&combo("ctrl+a"), ActionDescriptor::TypeText("x".into()));
        let mut reloaded = HotkeyRegistry::load(registry.store().clone());
        assert!(!reloaded.load_failed());
        assert!(reloaded.remove("ctrl+a"));
        assert!(!dir.path().join("shortcuts.json.bak").exists());
    }

    #[test]
    fn persisted_form_is_stable_under_reload() {
        let (_dir, mut registry) = temp_registry();
        registry.add(&combo("ctrl+alt+t"), ActionDescriptor::TypeText("héllo \"quoted\"".into()));
        registry.add(&combo("ctrl+shift"), ActionDescriptor::OpenUrl("example.com".into()));
        registry.add(&combo("f9"), ActionDescriptor::LaunchApp("/opt/app bin/run".into()));
        let first = fs::read(registry.store().path()).unwrap();

        let mut reloaded = HotkeyRegistry::load(registry.store().clone());
        assert!(reloaded.save());
        let second = fs::read(reloaded.store().path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn add_entry_validates_input() {
        let (_dir, mut registry) = temp_registry();
        assert!(registry.add_entry("T+Alt+Ctrl", ActionKind::TypeText, " hello "));
        assert_eq!(registry.get("ctrl+alt+t"), Some(&ActionDescriptor::TypeText("hello".into())));

        assert!(!registry.add_entry("ctrl", ActionKind::TypeText, "x"));
        assert!(!registry.add_entry("ctrl+x", ActionKind::LaunchApp, "   "));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("alt+ctrl+t"));
    }
}
