//! The message-oriented connection carrying envelopes.
//!
//! [`Connector`] performs the handshake and produces a [`Transport`], which
//! sends and receives whole text payloads. Framing is entirely the transport's
//! business: a payload handed to [`Transport::send_text`] arrives as one
//! message on the other side.
//!
//! [`WsConnector`] and [`WsTransport`] implement this over WebSockets using
//! [`tungstenite`].

use std::{io, net::TcpStream};
use tungstenite::{
    Message, WebSocket, client::IntoClientRequest, http::header::SEC_WEBSOCKET_PROTOCOL,
    stream::MaybeTlsStream,
};

/// A connected, message-oriented transport.
pub trait Transport {
    /// Sends one text payload.
    fn send_text(&mut self, text: String) -> io::Result<()>;

    /// Blocks until the next text payload arrives.
    ///
    /// Returns `None` once the transport is closed, whether by the peer, a network
    /// failure, or a local close. Transport failures are only ever observed this way.
    fn recv(&mut self) -> Option<String>;

    /// Starts closing the transport.
    fn close(&mut self) -> io::Result<()>;

    /// Subprotocol agreed on during the handshake, empty if none was.
    fn protocol(&self) -> &str {
        ""
    }
}

/// Opens [`Transport`]s to a URL.
pub trait Connector {
    type Transport: Transport + 'static;

    /// Checks that this connector can be used for `url`, without connecting.
    ///
    /// Called once, when a connection is constructed.
    fn check(&self, url: &str) -> Result<(), crate::Error> {
        let _ = url;
        Ok(())
    }

    /// Performs the handshake, returning an open transport.
    fn connect(&self, url: &str) -> io::Result<Self::Transport>;
}

/// Utility for converting a `tungstenite` error into a [`std::io::Error`].
#[inline(always)]
fn ws_to_io_err(e: tungstenite::Error) -> io::Error {
    match e {
        tungstenite::Error::Io(e) => e,
        e => io::Error::other(e),
    }
}

/// Returns `true` if `e` only reports that the connection is already closed.
#[inline(always)]
fn ws_err_is_closed(e: &tungstenite::Error) -> bool {
    matches!(
        e,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
    )
}

/// Connects to `ws://` URLs with [`tungstenite::connect`].
///
/// `tungstenite` is built without TLS support here, so `wss://` URLs are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn check(&self, url: &str) -> Result<(), crate::Error> {
        if url.starts_with("wss://") {
            return Err(crate::Error::TransportUnavailable(format!(
                "{url}: secure websockets aren't supported"
            )));
        }

        if !url.starts_with("ws://") {
            return Err(crate::Error::TransportUnavailable(format!(
                "{url} is not a websocket url"
            )));
        }

        url.into_client_request()
            .map(drop)
            .map_err(|e| crate::Error::TransportUnavailable(format!("{url}: {e}")))
    }

    fn connect(&self, url: &str) -> io::Result<WsTransport> {
        let (socket, response) = tungstenite::connect(url).map_err(ws_to_io_err)?;

        log::debug!("websocket handshake with {url} done ({})", response.status());

        let protocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        Ok(WsTransport::new(socket).with_protocol(protocol))
    }
}

/// A WebSocket carrying text payloads.
///
/// Binary frames holding valid UTF-8 are accepted as text. Ping and pong frames
/// are handled by [`tungstenite`] and never surface.
pub struct WsTransport<S = MaybeTlsStream<TcpStream>> {
    socket: WebSocket<S>,
    protocol: String,
}

impl<S> WsTransport<S> {
    /// Wraps an already established WebSocket.
    #[inline(always)]
    pub fn new(socket: WebSocket<S>) -> Self {
        Self {
            socket,
            protocol: String::new(),
        }
    }

    /// Records the subprotocol negotiated for this socket.
    #[inline]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[inline(always)]
    pub fn get_ref(&self) -> &WebSocket<S> {
        &self.socket
    }
}

impl<S: io::Read + io::Write> Transport for WsTransport<S> {
    #[inline]
    fn send_text(&mut self, text: String) -> io::Result<()> {
        self.socket.send(Message::Text(text)).map_err(ws_to_io_err)
    }

    fn recv(&mut self) -> Option<String> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(text),
                    Err(_) => log::warn!("dropping binary frame that isn't UTF-8"),
                },
                Ok(Message::Close(frame)) => {
                    log::debug!("close frame received: {frame:?}");
                    // send our half of the closing handshake
                    let _ = self.socket.flush();
                    return None;
                }
                Ok(_) => (),
                Err(e) if ws_err_is_closed(&e) => return None,
                Err(e) => {
                    log::warn!("websocket read failed: {e}");
                    return None;
                }
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.socket.close(None) {
            Err(e) if !ws_err_is_closed(&e) => Err(ws_to_io_err(e)),
            _ => Ok(()),
        }
    }

    #[inline(always)]
    fn protocol(&self) -> &str {
        &self.protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_connector_accepts_target_urls() {
        let url = crate::Target::default().url();
        assert!(WsConnector.check(&url).is_ok());
    }

    #[test]
    fn ws_connector_rejects_other_schemes() {
        let res = WsConnector.check("http://127.0.0.1:8080/interface");
        assert!(matches!(res, Err(crate::Error::TransportUnavailable(_))));
    }

    #[test]
    fn ws_connector_rejects_secure_urls() {
        let res = WsConnector.check("wss://127.0.0.1:8080/interface");
        assert!(matches!(res, Err(crate::Error::TransportUnavailable(_))));
    }

    #[test]
    fn ws_connector_rejects_invalid_hosts() {
        let res = WsConnector.check("ws://not a host:8080/interface");
        assert!(matches!(res, Err(crate::Error::TransportUnavailable(_))));
    }

    #[test]
    fn refused_handshake_is_an_io_error() {
        // bind then drop a listener to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .unwrap()
            .port();

        let url = crate::Target::new("127.0.0.1", port).url();
        assert!(WsConnector.connect(&url).is_err());
    }
}
