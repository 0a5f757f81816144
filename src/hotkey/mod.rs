//! X11 hotkey backend.

pub mod keybinding;
pub mod provider;
pub mod x11;

pub use provider::{X11HotkeyProvider, X11KeySource};
pub use x11::{RawKeyEvent, X11Context, X11Event, spawn_event_thread};
