use std::io::Write;
use std::time::{Duration, Instant};

use tickscope_stream::{StateStream, StreamError, StreamEvent};

const WAIT: Duration = Duration::from_secs(5);

fn capture(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp capture");
    for line in lines {
        writeln!(file, "{line}").expect("write capture");
    }
    file.flush().expect("flush capture");
    file
}

#[test]
fn replays_non_blank_lines_then_closes() {
    let file = capture(&[r#"{"tick":1,"updated":[]}"#, "", "   ", r#"{"tick":2,"updated":[]}"#]);
    let mut stream = StateStream::replay(file.path(), Duration::ZERO).expect("capture opens");

    let mut events = Vec::new();
    while let Some(event) = stream.recv_timeout(WAIT) {
        let done = matches!(event, StreamEvent::Closed { .. });
        events.push(event);
        if done {
            break;
        }
    }

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], StreamEvent::Opened);
    assert_eq!(events[1], StreamEvent::Message(r#"{"tick":1,"updated":[]}"#.to_string()));
    assert_eq!(events[2], StreamEvent::Message(r#"{"tick":2,"updated":[]}"#.to_string()));
    assert!(matches!(&events[3], StreamEvent::Closed { reason } if reason.contains("2 messages")));
}

#[test]
fn replay_paces_messages() {
    let file = capture(&["{}", "{}", "{}"]);
    let started = Instant::now();
    let mut stream = StateStream::replay(file.path(), Duration::from_millis(30)).expect("capture opens");

    let mut messages = 0;
    while let Some(event) = stream.recv_timeout(WAIT) {
        match event {
            StreamEvent::Message(_) => messages += 1,
            StreamEvent::Closed { .. } => break,
            StreamEvent::Opened => {}
        }
    }
    assert_eq!(messages, 3);
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[test]
fn dropping_a_replay_stops_it_early() {
    let lines: Vec<String> = (0..100).map(|tick| format!(r#"{{"tick":{tick}}}"#)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = capture(&refs);

    let started = Instant::now();
    let mut stream = StateStream::replay(file.path(), Duration::from_millis(20)).expect("capture opens");
    assert_eq!(stream.recv_timeout(WAIT), Some(StreamEvent::Opened));
    drop(stream);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn missing_capture_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = StateStream::replay(&dir.path().join("missing.jsonl"), Duration::ZERO);
    assert!(matches!(result, Err(StreamError::Io(_))));
}
