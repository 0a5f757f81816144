//! X11 integration — connection, key grabs, keyboard grab, event thread.
//!
//! Wraps `x11rb::rust_connection::RustConnection` for passive hotkey
//! grabs on the root window, the active keyboard grab used while
//! recording, and a polling event thread that feeds key events to the
//! main async loop.
//!
//! The keyboard mapping is snapshotted at connect time and re-read when
//! the server reports a keyboard `MappingNotify` (layout switch, xmodmap).
//! Grabs made against the old mapping stay in place until their owner
//! re-registers them.

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::thread::JoinHandle;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{self, GrabMode, GrabStatus, Mapping, ModMask, Window};
use x11rb::rust_connection::RustConnection;

use super::keybinding::{Binding, Keymap};
use crate::provider::ProviderError;

/// Lock modifier bits to mask during XGrabKey registration.
///
/// NumLock = Mod2 (bit 4), CapsLock = Lock (bit 1).
/// Each grab is registered 4 times with all combinations of these bits
/// so hotkeys fire regardless of lock state.
const LOCK_MASK: u16 = 0x0002; // LockMask (CapsLock)
const NUM_LOCK_MASK: u16 = 0x0010; // Mod2Mask (NumLock)
const LOCK_MASKS: [u16; 4] = [0, LOCK_MASK, NUM_LOCK_MASK, LOCK_MASK | NUM_LOCK_MASK];

/// A key press or release, as read off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub pressed: bool,
    pub keycode: u8,
    /// Modifier and button state before the event.
    pub state: u16,
}

/// What the event thread forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum X11Event {
    Key(RawKeyEvent),
    /// The keyboard mapping changed; keycodes may mean other keys now.
    KeymapChanged,
}

impl X11Event {
    fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::KeyPress(e) => Some(Self::Key(RawKeyEvent {
                pressed: true,
                keycode: e.detail,
                state: u16::from(e.state),
            })),
            Event::KeyRelease(e) => Some(Self::Key(RawKeyEvent {
                pressed: false,
                keycode: e.detail,
                state: u16::from(e.state),
            })),
            Event::MappingNotify(e) if e.request == Mapping::KEYBOARD => {
                Some(Self::KeymapChanged)
            }
            _ => None,
        }
    }
}

fn x11_err(what: &str, e: impl std::fmt::Display) -> ProviderError {
    ProviderError::X11(format!("{what}: {e}"))
}

fn fetch_keymap(conn: &RustConnection) -> Result<Keymap, ProviderError> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let mapping = xproto::get_keyboard_mapping(conn, min, max - min + 1)
        .map_err(|e| x11_err("get_keyboard_mapping", e))?
        .reply()
        .map_err(|e| x11_err("get_keyboard_mapping reply", e))?;
    Ok(Keymap::new(min, mapping.keysyms_per_keycode, mapping.keysyms))
}

/// X11 connection context shared by the hotkey provider and key source.
pub struct X11Context {
    conn: Arc<RustConnection>,
    root: Window,
    keymap: RwLock<Keymap>,
}

impl X11Context {
    /// Connect to the X11 display and snapshot the keyboard mapping.
    pub fn connect() -> Result<Self, ProviderError> {
        let (conn, screen_num) =
            RustConnection::connect(None).map_err(|e| x11_err("connect failed", e))?;

        let root = conn.setup().roots[screen_num].root;

        let keymap = fetch_keymap(&conn)?;

        Ok(Self {
            conn: Arc::new(conn),
            root,
            keymap: RwLock::new(keymap),
        })
    }

    /// Register a global key grab on the root window.
    ///
    /// Registers 4 grabs per binding (with/without NumLock/CapsLock).
    /// Returns `Ok(true)` on success, `Ok(false)` if the grab failed
    /// (another application holds it), `Err` on connection error.
    pub fn grab_key(&self, binding: &Binding) -> Result<bool, ProviderError> {
        let mut all_ok = true;

        for &lock_mask in &LOCK_MASKS {
            let mods = ModMask::from(binding.modifiers | lock_mask);

            let cookie = xproto::grab_key(
                &*self.conn,
                true, // owner_events
                self.root,
                mods,
                binding.keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|e| x11_err("grab_key send", e))?;

            // Check for error reply (grab conflict).
            if let Err(e) = cookie.check() {
                tracing::warn!(
                    binding = %binding.raw,
                    lock_mask,
                    error = %e,
                    "XGrabKey failed, binding may conflict with another application"
                );
                all_ok = false;
            }
        }

        Ok(all_ok)
    }

    /// Unregister a global key grab from the root window.
    ///
    /// Ungrabs all 4 lock-mask variants. Best-effort; errors are logged.
    pub fn ungrab_key(&self, binding: &Binding) {
        for &lock_mask in &LOCK_MASKS {
            let mods = ModMask::from(binding.modifiers | lock_mask);

            if let Err(e) = xproto::ungrab_key(&*self.conn, binding.keycode, self.root, mods) {
                tracing::debug!(
                    binding = %binding.raw,
                    error = %e,
                    "XUngrabKey failed"
                );
            }
        }

        self.flush();
    }

    /// Take the whole keyboard. While held, passive hotkey grabs of
    /// every client (ours included) stay silent.
    pub fn grab_keyboard(&self) -> Result<(), ProviderError> {
        let reply = xproto::grab_keyboard(
            &*self.conn,
            false, // owner_events: report everything to root
            self.root,
            x11rb::CURRENT_TIME,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )
        .map_err(|e| x11_err("grab_keyboard send", e))?
        .reply()
        .map_err(|e| x11_err("grab_keyboard reply", e))?;

        if reply.status != GrabStatus::SUCCESS {
            return Err(ProviderError::X11(format!(
                "keyboard grab refused: {:?}",
                reply.status
            )));
        }
        Ok(())
    }

    /// Release the keyboard grab. Best-effort.
    pub fn ungrab_keyboard(&self) {
        if let Err(e) = xproto::ungrab_keyboard(&*self.conn, x11rb::CURRENT_TIME) {
            tracing::debug!(error = %e, "XUngrabKeyboard failed");
        }
        self.flush();
    }

    fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            tracing::debug!(error = %e, "flush failed");
        }
    }

    /// Current keyboard mapping snapshot.
    pub fn keymap(&self) -> RwLockReadGuard<'_, Keymap> {
        self.keymap.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-read the keyboard mapping from the server.
    pub fn refresh_keymap(&self) -> Result<(), ProviderError> {
        let keymap = fetch_keymap(&self.conn)?;
        *self.keymap.write().unwrap_or_else(PoisonError::into_inner) = keymap;
        tracing::debug!("keyboard mapping refreshed");
        Ok(())
    }

    /// Get a shared reference to the X11 connection.
    pub fn conn(&self) -> &Arc<RustConnection> {
        &self.conn
    }
}

/// Spawn a dedicated thread that polls the X11 connection for key events.
///
/// Uses `nix::poll()` on the X11 connection fd with a 100ms timeout.
/// When readable, drains all available events via `poll_for_event()`
/// and forwards key presses, releases, and keyboard mapping changes.
/// Checks the `stop` flag each
/// iteration for clean shutdown.
pub fn spawn_event_thread(
    conn: Arc<RustConnection>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<(
    tokio::sync::mpsc::UnboundedReceiver<X11Event>,
    JoinHandle<()>,
)> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = std::thread::Builder::new()
        .name("x11-events".into())
        .spawn(move || {
            let raw_fd = conn.stream().as_raw_fd();

            while !stop.load(Ordering::Relaxed) {
                // SAFETY: raw_fd is the X11 connection fd, valid while conn is alive.
                let borrowed = unsafe { BorrowedFd::borrow_raw(raw_fd) };
                let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];

                match poll(&mut fds, PollTimeout::from(100u16)) {
                    Ok(0) => continue,
                    Ok(_) => loop {
                        let event = match conn.poll_for_event() {
                            Ok(Some(event)) => match X11Event::from_event(event) {
                                Some(event) => event,
                                None => continue,
                            },
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(error = %e, "X11 connection error");
                                return;
                            }
                        };
                        if tx.send(event).is_err() {
                            // Receiver dropped.
                            return;
                        }
                    },
                    Err(nix::Error::EINTR) => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "poll error on X11 fd");
                        return;
                    }
                }
            }
        })?;

    Ok((rx, handle))
}
