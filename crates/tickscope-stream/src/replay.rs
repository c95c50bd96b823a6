//! Capture playback: one JSON message per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::{StreamError, StreamEvent};

pub(crate) struct Capture {
    path: PathBuf,
    reader: BufReader<File>,
}

impl Capture {
    pub(crate) fn open(path: &Path) -> Result<Self, StreamError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }

    pub(crate) fn run(self, interval: Duration, tx: Sender<StreamEvent>, stop: Arc<AtomicBool>) {
        if tx.send(StreamEvent::Opened).is_err() {
            return;
        }
        let path = self.path.clone();
        let Some(reason) = self.play(interval, &tx, &stop) else {
            return;
        };
        info!(path = %path.display(), reason = %reason, "replay finished");
        let _ = tx.send(StreamEvent::Closed { reason });
    }

    /// `None` when the receiver went away.
    fn play(self, interval: Duration, tx: &Sender<StreamEvent>, stop: &AtomicBool) -> Option<String> {
        let mut sent = 0u64;
        for line in self.reader.lines() {
            if stop.load(Ordering::Relaxed) {
                return Some("closed by client".to_string());
            }
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(format!("capture read failed: {err}")),
            };
            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            if sent > 0 && !interval.is_zero() {
                thread::sleep(interval);
                if stop.load(Ordering::Relaxed) {
                    return Some("closed by client".to_string());
                }
            }
            tx.send(StreamEvent::Message(message.to_string())).ok()?;
            sent += 1;
        }
        Some(format!("end of capture after {sent} messages"))
    }
}
