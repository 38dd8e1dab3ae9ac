//! Client-side transport for the `simpleosc_proto` envelope format.
//!
//! This crate owns a single persistent WebSocket connection to an OSC bridge,
//! sends encoded envelopes over it, and dispatches the envelopes it receives to
//! user-provided callbacks.
//!
//! ## Scope
//!
//! - Connection target configuration, see [`config`]
//! - A transport abstraction with a [`tungstenite`] implementation, see [`transport`]
//! - The connection lifecycle and its callbacks, see [`client`]
//! - A default, line-oriented renderer for received envelopes, see [`dispatcher`]
//!
//! Everything is fire-and-forget: there are no acknowledgments, no retries and
//! no automatic reconnection. A closed [`Connection`](client::Connection) stays
//! closed.
//!
//! ## Model
//!
//! Connections are single-threaded and event-driven. Three transport events
//! (open, message, close) and synchronous sends drive the state machine, and
//! every callback runs to completion before the next event is handled.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod transport;
pub use simpleosc_proto as proto;
pub use tungstenite;

pub use client::{Connection, Handlers, Link, State};
pub use config::Target;

/// Errors surfaced by a connection.
///
/// Only [`TransportUnavailable`](Self::TransportUnavailable) is fatal. Everything
/// else is reported per-message and may be ignored.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection primitive can't be used for the configured target.
    /// Returned when constructing a connection.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
    /// `connect` was called on a connection that already left the idle state.
    #[error("connection is {0}, connections can't be reused")]
    NotIdle(State),
    /// A send was attempted while the connection wasn't open. Nothing was sent.
    #[error("not connected, connection is {0}")]
    NotConnected(State),
    /// An envelope couldn't be encoded, or a received payload couldn't be decoded.
    #[error(transparent)]
    Codec(#[from] proto::Error),
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error reports a received payload that failed to parse.
    #[inline(always)]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Codec(proto::Error::MalformedEnvelope(_)))
    }
}

/// Destination of human-readable diagnostic lines.
///
/// None of these lines affect the protocol. Closures taking a `&str` are sinks.
pub trait Sink {
    fn post(&mut self, line: &str);
}

/// Prints every line to standard output. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Sink for Stdout {
    #[inline(always)]
    fn post(&mut self, line: &str) {
        println!("{line}")
    }
}

/// Forwards every line to the [`log`] facade, at the `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    #[inline(always)]
    fn post(&mut self, line: &str) {
        log::info!("{line}")
    }
}

impl<F: FnMut(&str)> Sink for F {
    #[inline(always)]
    fn post(&mut self, line: &str) {
        self(line)
    }
}
