//! Daemon loop — keep every shortcut bound until told to stop.
//!
//! Startup binds all entries. SIGHUP re-reads the shortcuts file and
//! re-registers everything, as does a keyboard mapping change;
//! SIGINT/SIGTERM unbind and exit. A pid file
//! lets `hotbind add`/`remove`/`reload` find the running daemon.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::signal::unix::{SignalKind, signal};

use crate::action::ActionExecutor;
use crate::error::AppError;
use crate::hotkey::{X11Context, X11Event, X11HotkeyProvider, spawn_event_thread};
use crate::registry::{ConfigStore, HotkeyRegistry};
use crate::service::HotkeyService;

/// Pid file, removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Claim `path` for this process. Fails if another live daemon
    /// holds it; a stale file is replaced.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if let Some(pid) = read_pid(&path) {
            if is_alive(pid) && pid != std::process::id() as i32 {
                return Err(AppError::AlreadyRunning(pid));
            }
            tracing::debug!(pid, "replacing stale pid file");
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{}\n", std::process::id()))?;
        Ok(Self { path })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to remove pid file");
        }
    }
}

/// Pid recorded in `path`, if the file exists and parses.
pub fn read_pid(path: &Path) -> Option<i32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn is_alive(pid: i32) -> bool {
    // EPERM: exists, owned by someone else.
    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

/// Ask a running daemon to reload and re-register.
///
/// `Ok(false)` if no daemon is running.
pub fn signal_reload(pid_path: &Path) -> Result<bool, AppError> {
    let Some(pid) = read_pid(pid_path) else {
        return Ok(false);
    };
    match kill(Pid::from_raw(pid), Signal::SIGHUP) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Run the daemon until SIGINT or SIGTERM.
pub async fn run(config_path: PathBuf, pid_path: PathBuf) -> Result<(), AppError> {
    let ctx = Arc::new(X11Context::connect()?);
    let _pid = PidFile::create(pid_path)?;

    let registry = HotkeyRegistry::load(ConfigStore::new(&config_path));
    let entries = registry.len();
    let provider = X11HotkeyProvider::new(Arc::clone(&ctx));
    let mut service = HotkeyService::new(registry, provider, ActionExecutor::system());

    let bound = service.re_register_all();
    tracing::info!(
        config = %config_path.display(),
        entries,
        bound,
        "hotbind running"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let (mut events, thread) = spawn_event_thread(Arc::clone(ctx.conn()), Arc::clone(&stop))?;

    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(X11Event::Key(key)) => {
                    service.dispatcher().provider().dispatch(&key);
                }
                Some(X11Event::KeymapChanged) => match ctx.refresh_keymap() {
                    Ok(()) => {
                        let bound = service.re_register_all();
                        tracing::info!(bound, "keyboard mapping changed, shortcuts re-bound");
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to refresh keyboard mapping"),
                },
                None => {
                    tracing::error!("X11 event thread stopped");
                    break;
                }
            },
            _ = hangup.recv() => {
                let bound = service.reload();
                tracing::info!(bound, "shortcuts reloaded");
            }
            _ = interrupt.recv() => break,
            _ = terminate.recv() => break,
        }
    }

    tracing::info!("shutting down");
    service.shutdown();
    stop.store(true, Ordering::Relaxed);
    if thread.join().is_err() {
        tracing::warn!("X11 event thread panicked");
    }
    Ok(())
}
