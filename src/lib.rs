//! hotbind — bind key combinations to actions on an X11 desktop.
//!
//! A binding maps a combination such as `ctrl+alt+t` to one of three
//! actions: launch an application, open a URL, or type text. Bindings
//! live in a JSON file and are grabbed globally by a daemon.
//!
//! - [`keys`]: key name normalization and canonical combinations
//! - [`recorder`]: capture a combination from live key events
//! - [`registry`]: the persisted combination → action map
//! - [`dispatch`]: bind the registry to the OS and fire actions
//! - [`action`]: action descriptors and their execution
//! - [`service`]: the operations a front end drives
//! - [`provider`]: OS-facing traits; [`hotkey`] implements them on X11

pub mod action;
pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod hotkey;
pub mod keys;
pub mod provider;
pub mod record;
pub mod recorder;
pub mod registry;
pub mod service;
