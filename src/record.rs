//! Interactive recording against the X11 keyboard.
//!
//! Grabs the keyboard, feeds every key to a [`RecordingSession`], and
//! treats Enter as confirm and Esc as cancel. Those two keys never reach
//! the recorder, so they cannot end up in a combination.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::unbounded_channel;

use crate::error::AppError;
use crate::hotkey::{X11Context, X11Event, X11KeySource, spawn_event_thread};
use crate::keys::Combination;
use crate::recorder::{RecordError, RecorderStatus, RecordingSession};

/// Record one combination. `Ok(None)` if the user cancelled.
///
/// `on_status` receives every status change, including a fresh
/// [`RecorderStatus::Waiting`] when Enter is pressed too early.
pub async fn record_combination<F>(mut on_status: F) -> Result<Option<Combination>, AppError>
where
    F: FnMut(&RecorderStatus),
{
    let ctx = Arc::new(X11Context::connect()?);
    let source = X11KeySource::new(Arc::clone(&ctx));

    let (tx, mut statuses) = unbounded_channel();
    let mut session = RecordingSession::start(&source, tx, None)?;

    let stop = Arc::new(AtomicBool::new(false));
    let (mut events, thread) = spawn_event_thread(Arc::clone(ctx.conn()), Arc::clone(&stop))?;

    let outcome = loop {
        tokio::select! {
            Some(status) = statuses.recv() => on_status(&status),
            event = events.recv() => {
                let event = match event {
                    Some(X11Event::Key(key)) => key,
                    Some(X11Event::KeymapChanged) => {
                        if let Err(e) = ctx.refresh_keymap() {
                            tracing::warn!(error = %e, "failed to refresh keyboard mapping");
                        }
                        continue;
                    }
                    None => {
                        tracing::error!("X11 event thread stopped");
                        session.cancel();
                        break None;
                    }
                };
                let Some(name) = source.key_name(&event) else {
                    continue;
                };

                if event.pressed {
                    match name.as_str() {
                        "enter" => match session.confirm() {
                            Ok(combo) => break Some(combo),
                            Err(RecordError::NoCombinationRecorded) => {
                                on_status(&RecorderStatus::Waiting);
                                continue;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "confirm failed");
                                break None;
                            }
                        },
                        "esc" => {
                            session.cancel();
                            break None;
                        }
                        _ => {}
                    }
                }
                source.deliver(event.pressed, &name);
            }
        }
    };

    // Drain updates produced by the final key.
    while let Ok(status) = statuses.try_recv() {
        on_status(&status);
    }

    stop.store(true, Ordering::Relaxed);
    if thread.join().is_err() {
        tracing::warn!("X11 event thread panicked");
    }
    Ok(outcome)
}
