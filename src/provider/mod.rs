//! OS-facing collaborators — global hotkey subscription and the raw
//! key-event stream.
//!
//! The dispatcher and the recorder only talk to these traits. The X11
//! adapters in [`crate::hotkey`] implement them for a desktop session;
//! tests use in-crate fakes.

pub mod hotkey;
pub mod keys;

#[cfg(test)]
pub(crate) mod fakes;

use thiserror::Error;

pub use hotkey::{FireCallback, HotkeyProvider, SubscriptionId};
pub use keys::{HookId, KeyEventSource, KeyHandler};

/// Error from an OS-facing provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The combination string could not be parsed.
    #[error("malformed combination '{0}'")]
    Parse(String),
    /// A token has no key on this keyboard.
    #[error("unknown key '{key}' in '{combination}'")]
    UnknownKey { combination: String, key: String },
    /// The platform cannot express this combination as one grab.
    #[error("unsupported combination '{combination}': {reason}")]
    Unsupported {
        combination: String,
        reason: &'static str,
    },
    /// Another client already holds the grab.
    #[error("'{0}' is already grabbed by another application")]
    Conflict(String),
    /// The handle does not refer to a live subscription or hook.
    #[error("unknown handle {0}")]
    UnknownHandle(u64),
    /// X11 protocol or connection failure.
    #[error("X11: {0}")]
    X11(String),
}
