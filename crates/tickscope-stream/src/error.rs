use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("stream i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),
}
