//! ActionExecutor — perform an action's effect and report the outcome.

use std::sync::Arc;

use super::ActionDescriptor;
use super::sink::{ActionBackend, SystemBackend};

/// Runs descriptors against an [`ActionBackend`].
///
/// Never fails outward: every backend error is logged and reported as
/// `false`, so a broken action cannot take down the dispatcher.
#[derive(Clone)]
pub struct ActionExecutor {
    backend: Arc<dyn ActionBackend>,
}

impl ActionExecutor {
    pub fn new(backend: Arc<dyn ActionBackend>) -> Self {
        Self { backend }
    }

    /// Executor backed by the desktop's own programs.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemBackend))
    }

    pub fn execute(&self, action: &ActionDescriptor) -> bool {
        let result = match action {
            ActionDescriptor::LaunchApp(path) => self.backend.launch_app(path),
            ActionDescriptor::OpenUrl(url) => self.backend.open_url(url),
            ActionDescriptor::TypeText(text) => self.backend.type_text(text),
        };

        match result {
            Ok(()) => {
                tracing::info!(kind = %action.kind(), "action executed");
                true
            }
            Err(e) => {
                tracing::warn!(kind = %action.kind(), error = %e, "action failed");
                false
            }
        }
    }
}
