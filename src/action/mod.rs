//! Action descriptors — what a hotkey does when it fires.
//!
//! Persisted as `{"type": "<kind>", "value": "<payload>"}` with kind one
//! of `open_app`, `open_website`, `type_text`.

pub mod executor;
pub mod sink;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use executor::ActionExecutor;
pub use sink::{ActionBackend, ExecutionError, SystemBackend};

/// Descriptor validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0} needs a non-empty value")]
    EmptyValue(ActionKind),
    #[error("URL '{0}' contains whitespace")]
    InvalidUrl(String),
}

/// Action kind, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ActionKind {
    #[value(name = "open_app")]
    LaunchApp,
    #[value(name = "open_website")]
    OpenUrl,
    #[value(name = "type_text")]
    TypeText,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LaunchApp => "open_app",
            Self::OpenUrl => "open_website",
            Self::TypeText => "type_text",
        }
    }

    /// Human-readable label for listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::LaunchApp => "Launch app",
            Self::OpenUrl => "Open URL",
            Self::TypeText => "Type text",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hotkey does. Replaced wholesale on edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ActionDescriptor {
    /// Spawn the program at this path.
    #[serde(rename = "open_app")]
    LaunchApp(String),
    /// Open with the desktop's default handler.
    #[serde(rename = "open_website")]
    OpenUrl(String),
    /// Type into the focused window.
    #[serde(rename = "type_text")]
    TypeText(String),
}

impl ActionDescriptor {
    /// Build a validated descriptor. The value is trimmed and must not
    /// be empty; URLs must not contain whitespace.
    pub fn new(kind: ActionKind, value: &str) -> Result<Self, ActionError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ActionError::EmptyValue(kind));
        }

        Ok(match kind {
            ActionKind::LaunchApp => Self::LaunchApp(value.to_string()),
            ActionKind::OpenUrl => {
                if value.chars().any(char::is_whitespace) {
                    return Err(ActionError::InvalidUrl(value.to_string()));
                }
                Self::OpenUrl(value.to_string())
            }
            ActionKind::TypeText => Self::TypeText(value.to_string()),
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::LaunchApp(_) => ActionKind::LaunchApp,
            Self::OpenUrl(_) => ActionKind::OpenUrl,
            Self::TypeText(_) => ActionKind::TypeText,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::LaunchApp(v) | Self::OpenUrl(v) | Self::TypeText(v) => v,
        }
    }
}
