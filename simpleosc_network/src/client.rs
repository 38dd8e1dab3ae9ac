//! The connection manager.
//!
//! A [`Connection`] owns one transport to one bridge and sequences its lifecycle:
//!
//! ```text
//! Idle --connect--> Connecting --handshake done--> Open --close event--> Closed
//!                        |                                                  ^
//!                        +------------------handshake failed----------------+
//! ```
//!
//! `Closed` is terminal. Reconnecting requires a new [`Connection`].
//!
//! User code reacts to events through the callbacks registered in [`Handlers`].
//! Callbacks are handed the [`Link`], the sendable half of the connection, so
//! they can reply, post diagnostics, or hang up.

use crate::{
    Error, Sink, Stdout,
    config::Target,
    dispatcher,
    transport::{Connector, Transport, WsConnector},
};
use core::fmt;
use simpleosc_proto::{Argument, Envelope};

/// Address of the envelope sent by [`announce`].
pub const STATUS_ADDRESS: &str = "/browser/status";

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Constructed, `connect` not called yet.
    Idle,
    /// Transport handshake in flight.
    Connecting,
    /// Ready to send and receive.
    Open,
    /// Terminal. Nothing can be sent or received anymore.
    Closed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Called once, when the connection opens.
pub type OnConnect<T> = Box<dyn FnMut(&mut Link<T>)>;
/// Called once per successfully decoded inbound envelope.
pub type OnMessage<T> = Box<dyn FnMut(&mut Link<T>, Envelope)>;
/// Called once per inbound payload that failed to decode.
pub type OnError<T> = Box<dyn FnMut(&mut Link<T>, Error)>;

/// The sendable half of a connection: its state, transport and diagnostic sink.
pub struct Link<T> {
    transport: Option<T>,
    state: State,
    sink: Box<dyn Sink>,
}

impl<T> Link<T> {
    #[inline(always)]
    fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            transport: None,
            state: State::Idle,
            sink,
        }
    }

    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline(always)]
    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    /// Writes a line to the diagnostic sink.
    #[inline(always)]
    pub fn post(&mut self, line: &str) {
        self.sink.post(line)
    }

    /// Moves to `Closed` and releases the transport. Idempotent.
    fn mark_closed(&mut self) {
        if self.state == State::Closed {
            return;
        }

        log::debug!("connection {} -> closed", self.state);

        self.state = State::Closed;
        self.transport = None;
        self.post("Connection closed...");
    }
}

impl<T: Transport> Link<T> {
    /// Encodes `args`, tagging each of them, and sends the envelope to `address`.
    ///
    /// See [`send_envelope`](Self::send_envelope).
    pub fn send<I>(&mut self, address: &str, args: I, verbose: bool) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: Into<Argument>,
    {
        if !self.is_open() {
            return self.not_connected(verbose);
        }

        self.send_envelope(&simpleosc_proto::encode(address, args), verbose)
    }

    /// Sends an envelope, fire-and-forget.
    ///
    /// If the connection isn't open, nothing is sent, nothing is queued, and
    /// [`Error::NotConnected`] is returned. Callers may safely ignore it.
    ///
    /// If the transport fails to write, the connection is closed and the failure
    /// is returned.
    ///
    /// With `verbose`, a rendering of the outcome is posted to the sink.
    pub fn send_envelope(&mut self, envelope: &Envelope, verbose: bool) -> Result<(), Error> {
        let Some(transport) = self.transport.as_mut().filter(|_| self.state == State::Open) else {
            return self.not_connected(verbose);
        };

        let text = envelope.to_json()?;

        if let Err(e) = transport.send_text(text) {
            log::warn!("failed to send to {}: {e}", envelope.address);
            self.mark_closed();
            return Err(e.into());
        }

        if verbose {
            let line = format!("Sent OSC Msg to: {}", simpleosc_proto::render_verbose(envelope));
            self.post(&line);
        }

        Ok(())
    }

    #[inline]
    fn not_connected(&mut self, verbose: bool) -> Result<(), Error> {
        if verbose {
            let line = format!("Websocket is not connected, state: {}", self.state);
            self.post(&line);
        }

        Err(Error::NotConnected(self.state))
    }

    /// Closes the transport, if any, and moves to `Closed`.
    ///
    /// Failures while closing are logged, the connection is closed regardless.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            if let Err(e) = transport.close() {
                log::warn!("error while closing transport: {e}");
            }
        }

        self.mark_closed()
    }
}

/// Default connect callback: announces this client to the bridge.
pub fn announce<T: Transport>(link: &mut Link<T>) {
    let args = [
        Argument::from("Hello from the browser"),
        57120.into(),
        42.24.into(),
    ];

    if let Err(e) = link.send(STATUS_ADDRESS, args, false) {
        log::warn!("failed to announce: {e}");
    }
}

/// Default message callback: posts the [`dispatcher`] rendering of the envelope.
pub fn print_envelope<T>(link: &mut Link<T>, envelope: Envelope) {
    for line in dispatcher::render(&envelope) {
        link.post(&line)
    }
}

/// Default error callback: logs and drops the payload.
pub fn log_error<T>(_link: &mut Link<T>, error: Error) {
    log::warn!("dropping received payload: {error}")
}

/// Optional callbacks passed to [`Connection::connect`].
///
/// Missing callbacks are replaced by [`announce`], [`print_envelope`] and
/// [`log_error`] respectively.
pub struct Handlers<T> {
    on_connect: Option<OnConnect<T>>,
    on_message: Option<OnMessage<T>>,
    on_error: Option<OnError<T>>,
}

impl<T> Default for Handlers<T> {
    #[inline(always)]
    fn default() -> Self {
        Self {
            on_connect: None,
            on_message: None,
            on_error: None,
        }
    }
}

impl<T: Transport + 'static> Handlers<T> {
    /// All defaults.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, f: impl FnMut(&mut Link<T>) + 'static) -> Self {
        self.on_connect = Some(Box::new(f));
        self
    }

    pub fn on_message(mut self, f: impl FnMut(&mut Link<T>, Envelope) + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&mut Link<T>, Error) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn resolve(self) -> Callbacks<T> {
        Callbacks {
            on_connect: self
                .on_connect
                .unwrap_or_else(|| Box::new(announce::<T>) as OnConnect<T>),
            on_message: self
                .on_message
                .unwrap_or_else(|| Box::new(print_envelope::<T>) as OnMessage<T>),
            on_error: self
                .on_error
                .unwrap_or_else(|| Box::new(log_error::<T>) as OnError<T>),
        }
    }
}

/// Callbacks registered by `connect`, defaults filled in.
struct Callbacks<T> {
    on_connect: OnConnect<T>,
    on_message: OnMessage<T>,
    on_error: OnError<T>,
}

/// A single session with one bridge.
///
/// The connection exclusively owns its transport, and holds at most one at a
/// time. It isn't meant to be shared between threads: all interaction happens
/// from the control flow that drives it (see [`run`](Self::run)).
pub struct Connection<C: Connector = WsConnector> {
    target: Target,
    url: String,
    connector: C,
    link: Link<C::Transport>,
    callbacks: Option<Callbacks<C::Transport>>,
}

impl Connection {
    /// Creates an idle WebSocket connection to `target`.
    ///
    /// Fails with [`Error::TransportUnavailable`] if no WebSocket can be opened to
    /// the target's URL.
    #[inline(always)]
    pub fn new(target: Target) -> Result<Self, Error> {
        Self::with_connector(target, WsConnector)
    }
}

impl<C: Connector> Connection<C> {
    /// Creates an idle connection to `target` using a custom connector.
    pub fn with_connector(target: Target, connector: C) -> Result<Self, Error> {
        let url = target.url();

        connector.check(&url)?;

        Ok(Self {
            target,
            url,
            connector,
            link: Link::new(Box::new(Stdout)),
            callbacks: None,
        })
    }

    /// Replaces the diagnostic sink (standard output by default).
    #[inline]
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.link.sink = Box::new(sink);
        self
    }

    #[inline(always)]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline(always)]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline(always)]
    pub fn state(&self) -> State {
        self.link.state
    }

    #[inline(always)]
    pub fn link(&mut self) -> &mut Link<C::Transport> {
        &mut self.link
    }

    /// Registers `handlers` and performs the transport handshake.
    ///
    /// On success the connection is `Open`, and the connect callback has already
    /// run, before any inbound message could be dispatched. If the handshake fails,
    /// the connection is `Closed` and the transport error is returned.
    ///
    /// Only valid on an idle connection.
    pub fn connect(&mut self, handlers: Handlers<C::Transport>) -> Result<(), Error> {
        if self.link.state != State::Idle {
            return Err(Error::NotIdle(self.link.state));
        }

        let callbacks = self.callbacks.insert(handlers.resolve());

        self.link.state = State::Connecting;
        self.link
            .post(&format!("Creating WebSocket connection to {}", self.url));

        match self.connector.connect(&self.url) {
            Ok(transport) => {
                let protocol = format!("Protocol:{}", transport.protocol());

                self.link.transport = Some(transport);
                self.link.state = State::Open;
                self.link.post("Connection successful!");
                self.link.post(&protocol);

                (callbacks.on_connect)(&mut self.link);

                Ok(())
            }
            Err(e) => {
                log::warn!("handshake with {} failed: {e}", self.url);
                self.link.mark_closed();
                Err(e.into())
            }
        }
    }

    /// Same as [`Link::send`].
    #[inline(always)]
    pub fn send<I>(&mut self, address: &str, args: I, verbose: bool) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: Into<Argument>,
    {
        self.link.send(address, args, verbose)
    }

    /// Same as [`Link::send_envelope`].
    #[inline(always)]
    pub fn send_envelope(&mut self, envelope: &Envelope, verbose: bool) -> Result<(), Error> {
        self.link.send_envelope(envelope, verbose)
    }

    /// Handles one payload received from the transport.
    ///
    /// Payloads are ignored unless the connection is open. A payload that decodes
    /// is handed to the message callback. One that doesn't is reported to the error
    /// callback, and the connection stays open.
    pub fn handle_message(&mut self, raw: &str) {
        let Some(callbacks) = self.callbacks.as_mut().filter(|_| self.link.is_open()) else {
            log::debug!("ignoring payload received while {}", self.link.state);
            return;
        };

        match simpleosc_proto::decode(raw) {
            Ok(envelope) => (callbacks.on_message)(&mut self.link, envelope),
            Err(e) => (callbacks.on_error)(&mut self.link, e.into()),
        }
    }

    /// Handles the transport reporting it closed.
    #[inline(always)]
    pub fn handle_close(&mut self) {
        self.link.mark_closed()
    }

    /// Waits for the next transport event and handles it.
    ///
    /// Returns whether the connection is still open afterwards.
    pub fn step(&mut self) -> bool {
        let Some(transport) = self.link.transport.as_mut().filter(|_| self.link.state == State::Open) else {
            return false;
        };

        match transport.recv() {
            Some(raw) => self.handle_message(&raw),
            None => self.handle_close(),
        }

        self.link.is_open()
    }

    /// Handles transport events until the connection closes.
    ///
    /// Returns immediately if the connection isn't open.
    #[inline]
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// Closes the connection from this side. No-op if already closed.
    #[inline(always)]
    pub fn close(&mut self) {
        self.link.close()
    }
}
