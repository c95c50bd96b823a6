use core::fmt;
use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use tungstenite::handshake::HandshakeError;
use tungstenite::http::Uri;
use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

use crate::{StreamError, StreamEvent};

/// Socket read timeout; bounds how long a stop request waits.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A validated `ws://host[:port]/path` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrl {
    uri: Uri,
    host: String,
    port: u16,
}

impl StreamUrl {
    pub fn parse(url: &str) -> Result<Self, StreamError> {
        let invalid = |reason| StreamError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let uri: Uri = url.trim().parse().map_err(|_| invalid("not a URL"))?;
        match uri.scheme_str() {
            Some("ws") => {}
            Some("wss") => return Err(invalid("wss:// is not supported")),
            _ => return Err(invalid("scheme must be ws://")),
        }
        let host = uri
            .host()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(80);
        Ok(Self { uri, host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

pub(crate) fn run(target: StreamUrl, tx: Sender<StreamEvent>, stop: Arc<AtomicBool>) {
    let reason = match open(&target) {
        Ok(mut socket) => {
            info!(url = %target, "state stream opened");
            if tx.send(StreamEvent::Opened).is_err() {
                let _ = socket.close(None);
                return;
            }
            pump(&mut socket, &tx, &stop)
        }
        Err(err) => {
            warn!(url = %target, error = %err, "state stream unavailable");
            err.to_string()
        }
    };
    info!(url = %target, reason = %reason, "state stream closed");
    let _ = tx.send(StreamEvent::Closed { reason });
}

fn open(target: &StreamUrl) -> Result<WebSocket<TcpStream>, StreamError> {
    let tcp = TcpStream::connect((target.host.as_str(), target.port))?;
    tcp.set_nodelay(true)?;
    tcp.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    let (socket, _response) =
        tungstenite::client(target.uri.clone(), tcp).map_err(|err| match err {
            HandshakeError::Failure(err) => StreamError::Handshake(err.to_string()),
            HandshakeError::Interrupted(_) => {
                StreamError::Handshake("timed out waiting for the server".to_string())
            }
        })?;
    socket.get_ref().set_read_timeout(Some(POLL_INTERVAL))?;
    Ok(socket)
}

/// Forwards frames until the connection ends or a stop is requested. Returns the close reason.
fn pump(
    socket: &mut WebSocket<TcpStream>,
    tx: &Sender<StreamEvent>,
    stop: &AtomicBool,
) -> String {
    let mut server_reason = None;
    loop {
        if stop.load(Ordering::Relaxed) {
            let _ = socket.close(None);
            let _ = socket.flush();
            return "closed by client".to_string();
        }

        let text = match socket.read() {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    debug!(len = err.as_bytes().len(), "dropping non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                server_reason = Some(match frame {
                    Some(frame) if !frame.reason.is_empty() => {
                        format!("closed by server: {}", frame.reason)
                    }
                    _ => "closed by server".to_string(),
                });
                continue;
            }
            Ok(_) => continue,
            Err(WsError::Io(err))
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                continue
            }
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                return server_reason.unwrap_or_else(|| "connection closed".to_string());
            }
            Err(err) => return server_reason.unwrap_or_else(|| err.to_string()),
        };

        if tx.send(StreamEvent::Message(text)).is_err() {
            let _ = socket.close(None);
            let _ = socket.flush();
            return "receiver dropped".to_string();
        }
    }
}
