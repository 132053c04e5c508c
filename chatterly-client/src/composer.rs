//! Message composer with typing-indicator debounce.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use shared::models::{ClientIntent, RoomId};
use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

use crate::{
    channel::IntentSink,
    error::{ClientError, ClientResult},
};

/// A single-shot delayed task; scheduling again replaces the pending one.
#[derive(Debug, Default)]
struct StopTimer {
    pending: Option<JoinHandle<()>>,
}

impl StopTimer {
    fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(task));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for StopTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Composer state for one room.
///
/// Emits `typing:start` on the first non-empty keystroke and `typing:stop`
/// once input has been idle for the configured duration, or on send. Must be
/// used from within a tokio runtime.
#[derive(Debug)]
pub struct Composer {
    room_id: RoomId,
    text: String,
    enabled: bool,
    typing: Arc<AtomicBool>,
    timer: StopTimer,
    idle: Duration,
    sink: Arc<dyn IntentSink>,
}

impl Composer {
    /// Empty, enabled composer for `room_id`.
    #[must_use]
    pub fn new(room_id: RoomId, idle: Duration, sink: Arc<dyn IntentSink>) -> Self {
        Self {
            room_id,
            text: String::new(),
            enabled: true,
            typing: Arc::new(AtomicBool::new(false)),
            timer: StopTimer::default(),
            idle,
            sink,
        }
    }

    /// Current draft.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Room the composer sends to.
    #[must_use]
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether `typing:start` was sent without a matching stop yet.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing.load(Ordering::SeqCst)
    }

    /// Whether input and send are accepted.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled while the live channel is down.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the composer text, as on each keystroke.
    ///
    /// # Errors
    /// Returns the sink error when `typing:start` cannot be emitted.
    pub fn input(&mut self, text: impl Into<String>) -> ClientResult<()> {
        self.text = text.into();

        if !self.text.is_empty() && !self.typing.swap(true, Ordering::SeqCst) {
            if let Err(err) = self.sink.emit(ClientIntent::typing_start(self.room_id.clone())) {
                self.typing.store(false, Ordering::SeqCst);
                return Err(err);
            }
        }

        if self.is_typing() {
            let typing = Arc::clone(&self.typing);
            let sink = Arc::clone(&self.sink);
            let room_id = self.room_id.clone();
            let idle = self.idle;
            self.timer.schedule(async move {
                sleep(idle).await;
                if typing.swap(false, Ordering::SeqCst) {
                    emit_stop(sink.as_ref(), room_id);
                }
            });
        }
        Ok(())
    }

    /// Send the trimmed text. Returns `Ok(false)` when there is nothing to send.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] when disabled, or the sink error; the
    /// text is kept in both cases.
    pub fn send(&mut self) -> ClientResult<bool> {
        let content = self.text.trim();
        if content.is_empty() {
            return Ok(false);
        }
        if !self.enabled {
            return Err(ClientError::NotConnected);
        }

        self.sink
            .emit(ClientIntent::send_text(self.room_id.clone(), content))?;
        self.text.clear();
        self.stop_typing();
        Ok(true)
    }

    fn stop_typing(&mut self) {
        self.timer.cancel();
        if self.typing.swap(false, Ordering::SeqCst) {
            emit_stop(self.sink.as_ref(), self.room_id.clone());
        }
    }
}

impl Drop for Composer {
    fn drop(&mut self) {
        self.stop_typing();
    }
}

fn emit_stop(sink: &dyn IntentSink, room_id: RoomId) {
    if let Err(err) = sink.emit(ClientIntent::typing_stop(room_id)) {
        debug!(error = %err, "typing stop not delivered");
    }
}
