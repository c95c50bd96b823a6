use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tickscope_stream::{StateStream, StreamError, StreamEvent};
use tungstenite::protocol::Message;

const WAIT: Duration = Duration::from_secs(5);

fn next(stream: &mut StateStream) -> StreamEvent {
    stream.recv_timeout(WAIT).expect("event within timeout")
}

#[test]
fn forwards_text_frames_in_order_then_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().expect("accept");
        let mut ws = tungstenite::accept(tcp).expect("server handshake");
        ws.send(Message::Text(r#"{"tick":1,"updated":[]}"#.to_string()))
            .expect("send 1");
        ws.send(Message::Binary(br#"{"tick":2,"updated":[]}"#.to_vec()))
            .expect("send 2");
        ws.send(Message::Binary(vec![0xff, 0xfe])).expect("send 3");
        ws.send(Message::Text(r#"{"tick":3,"updated":[]}"#.to_string()))
            .expect("send 4");
        ws.close(None).expect("close");
        while ws.read().is_ok() {}
    });

    let mut stream = StateStream::connect(&format!("ws://{addr}/ws")).expect("valid url");
    assert_eq!(next(&mut stream), StreamEvent::Opened);
    assert_eq!(
        next(&mut stream),
        StreamEvent::Message(r#"{"tick":1,"updated":[]}"#.to_string())
    );
    assert_eq!(
        next(&mut stream),
        StreamEvent::Message(r#"{"tick":2,"updated":[]}"#.to_string())
    );
    assert_eq!(
        next(&mut stream),
        StreamEvent::Message(r#"{"tick":3,"updated":[]}"#.to_string())
    );
    assert!(matches!(next(&mut stream), StreamEvent::Closed { .. }));
    assert_eq!(stream.recv_timeout(Duration::from_millis(100)), None);

    server.join().expect("server thread");
}

#[test]
fn close_stops_worker_and_notifies_server() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let (closed_tx, closed_rx) = mpsc::channel();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().expect("accept");
        let mut ws = tungstenite::accept(tcp).expect("server handshake");
        ws.send(Message::Text("{}".to_string())).expect("send");
        let saw_close = loop {
            match ws.read() {
                Ok(Message::Close(_)) => break true,
                Ok(_) => continue,
                Err(_) => break false,
            }
        };
        closed_tx.send(saw_close).expect("report");
    });

    let mut stream = StateStream::connect(&format!("ws://{addr}/ws")).expect("valid url");
    assert_eq!(next(&mut stream), StreamEvent::Opened);
    assert_eq!(next(&mut stream), StreamEvent::Message("{}".to_string()));
    stream.close();

    assert_eq!(closed_rx.recv_timeout(WAIT), Ok(true));
    server.join().expect("server thread");
}

#[test]
fn refused_connection_reports_closed() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.local_addr().expect("local addr")
    };

    let mut stream = StateStream::connect(&format!("ws://{addr}/ws")).expect("valid url");
    match next(&mut stream) {
        StreamEvent::Closed { reason } => assert!(!reason.is_empty()),
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[test]
fn invalid_urls_fail_up_front() {
    for url in ["http://127.0.0.1:8080/ws", "not a url", "wss://127.0.0.1/ws"] {
        assert!(
            matches!(StateStream::connect(url), Err(StreamError::InvalidUrl { .. })),
            "accepted {url}"
        );
    }
}

#[test]
fn detached_stream_reads_existing_channel() {
    let (tx, rx) = mpsc::channel();
    let mut stream = StateStream::detached(rx);
    tx.send(StreamEvent::Opened).expect("send");
    tx.send(StreamEvent::Message("a".to_string())).expect("send");

    assert_eq!(
        stream.drain(),
        vec![StreamEvent::Opened, StreamEvent::Message("a".to_string())]
    );
    assert_eq!(stream.try_next(), None);
    assert_eq!(stream.source(), "detached");
}

#[test]
fn sender_vanishing_reads_as_closed_once() {
    let (tx, rx) = mpsc::channel();
    let mut stream = StateStream::detached(rx);
    tx.send(StreamEvent::Message("a".to_string())).expect("send");
    drop(tx);

    assert_eq!(
        stream.recv_timeout(WAIT),
        Some(StreamEvent::Message("a".to_string()))
    );
    assert!(matches!(
        stream.recv_timeout(WAIT),
        Some(StreamEvent::Closed { .. })
    ));
    assert_eq!(stream.recv_timeout(Duration::from_millis(10)), None);
    assert!(stream.drain().is_empty());
}

#[test]
fn closed_from_worker_is_not_repeated() {
    let (tx, rx) = mpsc::channel();
    let mut stream = StateStream::detached(rx);
    tx.send(StreamEvent::Closed {
        reason: "done".to_string(),
    })
    .expect("send");
    drop(tx);

    assert_eq!(
        stream.drain(),
        vec![StreamEvent::Closed {
            reason: "done".to_string()
        }]
    );
    assert_eq!(stream.try_next(), None);
}
