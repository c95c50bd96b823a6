//! State-stream transport.
//!
//! A [`StateStream`] is a long-lived connection handle: opening it starts one worker thread that
//! forwards complete messages over a channel, and dropping (or [`StateStream::close`]) stops and
//! joins the worker. There is no reconnection; when the connection ends the stream yields a single
//! [`StreamEvent::Closed`] and goes quiet. A worker that goes away without saying so (a panic) is
//! reported as closed too.
//!
//! Consumers poll with [`StateStream::try_next`] / [`StateStream::drain`] from a frame loop, or
//! block with [`StateStream::recv_timeout`] in headless tools.

#![forbid(unsafe_code)]

mod error;
mod replay;
mod websocket;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

pub use error::StreamError;
pub use websocket::StreamUrl;

/// Producer tick period; default pacing for capture replay.
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The connection is established and messages may follow.
    Opened,
    /// One complete message, as text.
    Message(String),
    /// The connection ended or could not be established. Sent at most once, always last.
    Closed { reason: String },
}

#[derive(Debug)]
pub struct StateStream {
    source: String,
    events: Receiver<StreamEvent>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    /// `Closed` was handed out.
    finished: bool,
}

impl StateStream {
    /// Starts connecting to a `ws://` endpoint in the background.
    ///
    /// Only the URL is checked here; connection and handshake failures arrive as
    /// [`StreamEvent::Closed`].
    pub fn connect(url: &str) -> Result<Self, StreamError> {
        let target = StreamUrl::parse(url)?;
        info!(url = %target, "connecting to state stream");
        let source = target.to_string();
        Self::spawn(source, "tickscope-ws", move |tx, stop| {
            websocket::run(target, tx, stop)
        })
    }

    /// Plays back a capture file of one JSON message per line, one line per `interval`.
    pub fn replay(path: &Path, interval: Duration) -> Result<Self, StreamError> {
        let capture = replay::Capture::open(path)?;
        info!(path = %path.display(), interval_ms = interval.as_millis() as u64, "replaying capture");
        Self::spawn(
            path.display().to_string(),
            "tickscope-replay",
            move |tx, stop| capture.run(interval, tx, stop),
        )
    }

    /// Wraps a channel fed by someone else. Closing such a stream only drops the receiver.
    pub fn detached(events: Receiver<StreamEvent>) -> Self {
        Self {
            source: "detached".to_string(),
            events,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            finished: false,
        }
    }

    fn spawn<F>(source: String, name: &str, body: F) -> Result<Self, StreamError>
    where
        F: FnOnce(mpsc::Sender<StreamEvent>, Arc<AtomicBool>) + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(tx, worker_stop))?;
        Ok(Self {
            source,
            events,
            stop,
            worker: Some(worker),
            finished: false,
        })
    }

    /// URL or capture path this stream reads from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn try_next(&mut self) -> Option<StreamEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(self.delivered(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.worker_gone(),
        }
    }

    /// Every event that is already waiting, in arrival order.
    pub fn drain(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    /// Blocks up to `timeout`. `None` on timeout and after `Closed` was delivered.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<StreamEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(self.delivered(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.worker_gone(),
        }
    }

    fn delivered(&mut self, event: StreamEvent) -> StreamEvent {
        if matches!(event, StreamEvent::Closed { .. }) {
            self.finished = true;
        }
        event
    }

    /// The sender is gone. Synthesizes `Closed` unless the worker already sent it.
    fn worker_gone(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        self.finished = true;
        warn!(source = %self.source, "stream worker stopped without closing");
        Some(StreamEvent::Closed {
            reason: "stream worker stopped".to_string(),
        })
    }

    /// Stops the worker and waits for it. Same as dropping the stream.
    pub fn close(self) {}

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(source = %self.source, "stream worker panicked");
            }
        }
    }
}

impl Drop for StateStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}
