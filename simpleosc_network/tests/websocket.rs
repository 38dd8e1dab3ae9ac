//! End-to-end exchange with a bridge stand-in running on loopback.

use simpleosc_network::{
    Connection, Error, Handlers, State, Target,
    proto::{Envelope, Tag, TypedArgument},
    tungstenite::{self, Message},
};
use std::{
    cell::RefCell,
    net::TcpListener,
    rc::Rc,
    thread,
    time::Duration,
};

const ANNOUNCE_WIRE: &str = r#"{"address":"/browser/status","args":[{"type":"s","value":"Hello from the browser"},{"type":"i","value":57120},{"type":"f","value":42.24}]}"#;

/// Accepts one client, records what it sends first, replies with `replies`, then closes.
fn spawn_bridge(replies: Vec<String>) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let mut ws = tungstenite::accept(stream).unwrap();
        let mut received = Vec::new();

        match ws.read().unwrap() {
            Message::Text(text) => received.push(text),
            other => panic!("expected a text frame, got {other:?}"),
        }

        for reply in replies {
            ws.send(Message::Text(reply)).unwrap();
        }

        // the client may already be gone
        let _ = ws.close(None);

        // drain until the client completes the closing handshake
        loop {
            match ws.read() {
                Ok(Message::Text(text)) => received.push(text),
                Ok(_) => (),
                Err(_) => break,
            }
        }

        received
    });

    (port, handle)
}

#[test]
fn announce_dispatch_and_close() {
    let (port, bridge) = spawn_bridge(vec![
        r#"{"address":"/foo","args":[{"type":"i","value":7}]}"#.into(),
        "not json at all".into(),
        r#"{"address":"/bar","args":[{"type":"s","value":"hi"},{"type":"f","value":0.5}]}"#
            .into(),
    ]);

    let lines = Rc::new(RefCell::new(Vec::<String>::new()));
    let messages = Rc::new(RefCell::new(Vec::<Envelope>::new()));
    let errors = Rc::new(RefCell::new(Vec::<Error>::new()));

    let sink = lines.clone();
    let mut conn = Connection::new(Target::new("127.0.0.1", port))
        .unwrap()
        .with_sink(move |line: &str| sink.borrow_mut().push(line.to_owned()));

    let (m, e) = (messages.clone(), errors.clone());
    conn.connect(
        Handlers::new()
            .on_message(move |_, env| m.borrow_mut().push(env))
            .on_error(move |_, err| e.borrow_mut().push(err)),
    )
    .unwrap();

    assert_eq!(conn.state(), State::Open);

    conn.run();

    assert_eq!(conn.state(), State::Closed);
    assert_eq!(
        *messages.borrow(),
        [
            Envelope::with_args("/foo", [TypedArgument::new(Tag::Int, 7)]),
            Envelope::with_args(
                "/bar",
                [
                    TypedArgument::new(Tag::String, "hi"),
                    TypedArgument::new(Tag::Float, 0.5)
                ]
            ),
        ]
    );
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].is_malformed());

    assert!(matches!(
        conn.send("/late", [1], false),
        Err(Error::NotConnected(State::Closed))
    ));

    assert_eq!(bridge.join().unwrap(), [ANNOUNCE_WIRE]);
    assert_eq!(
        lines.borrow().last().map(String::as_str),
        Some("Connection closed...")
    );
}

#[test]
fn local_close() {
    let (port, bridge) = spawn_bridge(Vec::new());

    let mut conn = Connection::new(Target::new("127.0.0.1", port))
        .unwrap()
        .with_sink(|_: &str| ());

    conn.connect(Handlers::new().on_connect(|link| {
        link.send("/hello", ["there"], false).unwrap();
        link.close();
    }))
    .unwrap();

    assert_eq!(conn.state(), State::Closed);
    assert!(!conn.step());

    assert_eq!(
        bridge.join().unwrap(),
        [r#"{"address":"/hello","args":[{"type":"s","value":"there"}]}"#]
    );
}

#[test]
fn nobody_listening() {
    let port = TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .unwrap()
        .port();

    let mut conn = Connection::new(Target::new("127.0.0.1", port))
        .unwrap()
        .with_sink(|_: &str| ());

    assert!(matches!(
        conn.connect(Handlers::new()),
        Err(Error::Transport(_))
    ));
    assert_eq!(conn.state(), State::Closed);
}
