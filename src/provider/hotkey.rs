//! HotkeyProvider trait — global combination subscription.

use super::ProviderError;

/// Opaque handle for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback run when a subscribed combination fires.
///
/// Invoked from the provider's event context, never from the UI
/// thread. It must not block.
pub type FireCallback = Box<dyn Fn() + Send + Sync>;

/// Subscribes combinations to the OS global hotkey facility.
///
/// Platform adapters implement this to hide the grab mechanism from the
/// dispatcher. Each subscription owns its callback; the provider calls
/// it whenever the combination is pressed, regardless of focus.
pub trait HotkeyProvider {
    /// Subscribe `combination` (canonical string form) and route firing
    /// events to `callback`.
    ///
    /// Fails if the string is malformed, names a key the platform cannot
    /// resolve, or is already grabbed elsewhere.
    fn subscribe(
        &mut self,
        combination: &str,
        callback: FireCallback,
    ) -> Result<SubscriptionId, ProviderError>;

    /// Release a subscription.
    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), ProviderError>;
}
