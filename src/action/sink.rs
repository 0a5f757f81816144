//! Action sinks — process launch, URL open, and text injection.
//!
//! Each primitive spawns an external program and returns once it has
//! started. Exit status is collected by a background task and only
//! logged, so a slow child never blocks the hotkey event loop.
//!
//! Spawning goes through `tokio::process`, so these must run inside a
//! Tokio runtime.

use std::borrow::Cow;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tokio::process::{Child, Command};

/// An action's external effect failed to start.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// OS primitives an action executes through.
pub trait ActionBackend: Send + Sync {
    /// Start the program at `path`, detached from this process.
    fn launch_app(&self, path: &str) -> Result<(), ExecutionError>;

    /// Open `url` with the desktop's default handler.
    fn open_url(&self, url: &str) -> Result<(), ExecutionError>;

    /// Type `text` into the focused window as synthetic keystrokes.
    fn type_text(&self, text: &str) -> Result<(), ExecutionError>;
}

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Prefix `https://` onto URLs that carry no scheme.
pub fn with_scheme(url: &str) -> Cow<'_, str> {
    if URL_SCHEME.is_match(url) {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("https://{url}"))
    }
}

/// Desktop backend: the program itself, `xdg-open`, and `xdotool`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl ActionBackend for SystemBackend {
    fn launch_app(&self, path: &str) -> Result<(), ExecutionError> {
        let mut cmd = Command::new(path);
        // Own process group, so the app outlives us and ignores our signals.
        cmd.process_group(0);
        spawn_detached(path, &mut cmd)
    }

    fn open_url(&self, url: &str) -> Result<(), ExecutionError> {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(with_scheme(url).as_ref());
        spawn_detached("xdg-open", &mut cmd)
    }

    fn type_text(&self, text: &str) -> Result<(), ExecutionError> {
        let mut cmd = Command::new("xdotool");
        cmd.args(["type", "--clearmodifiers", "--"]).arg(text);
        spawn_detached("xdotool", &mut cmd)
    }
}

/// Spawn `cmd` with null stdio and reap it in the background.
fn spawn_detached(program: &str, cmd: &mut Command) -> Result<(), ExecutionError> {
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ExecutionError::Spawn {
            program: program.to_string(),
            source,
        })?;

    tokio::spawn(reap(program.to_string(), child));
    Ok(())
}

async fn reap(program: String, mut child: Child) {
    match child.wait().await {
        Ok(status) if status.success() => {
            tracing::debug!(program = %program, "action process exited");
        }
        Ok(status) => {
            tracing::warn!(program = %program, %status, "action process exited with failure");
        }
        Err(e) => {
            tracing::debug!(program = %program, error = %e, "wait on action process failed");
        }
    }
}
