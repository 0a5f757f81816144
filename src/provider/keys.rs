//! KeyEventSource trait — the raw key-down/key-up stream.

use std::sync::Arc;

use super::ProviderError;

/// Handle for one installed key handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

/// Handler for raw key events. Receives the raw key name (e.g.
/// `"left ctrl"`), not a normalized token.
pub type KeyHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Delivers raw key events from the whole desktop.
///
/// While any handler is installed the source holds the stream
/// exclusively; removing the last handler must release it. Methods take
/// `&self` so a caller can keep feeding events while a recording
/// session holds hooks.
pub trait KeyEventSource {
    /// Install a key-down handler.
    fn on_key_down(&self, handler: KeyHandler) -> Result<HookId, ProviderError>;

    /// Install a key-up handler.
    fn on_key_up(&self, handler: KeyHandler) -> Result<HookId, ProviderError>;

    /// Remove a handler. Unknown ids are ignored.
    fn unhook(&self, id: HookId);
}
