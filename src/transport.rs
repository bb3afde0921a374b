//! Resolve a connection string into a concrete transport.
//!
//! Accepted shape: `[scheme://]host:port`
//!
//! - scheme: `tcp://` or `ws://`, default `tcp://`
//! - host: one or more chars, none of them `/` or `:`
//! - port: a decimal number of at least two digits, not starting with `0`
//!
//! Single-digit ports such as `host:9` do not match and are reported as invalid.

use log::*;
use rsocket_core::SocketConfig;
use rsocket_core::error::RSocketError;
use rsocket_tcp::{TcpClientTransport, TcpServerListener, TcpServerTransport, TcpStream};
use rsocket_ws::{
    DEFAULT_WEBSOCKET_PATH, WsClientStream, WsClientTransport, WsServerListener, WsServerStream,
    WsServerTransport,
};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(strum::Display, strum::AsRefStr, PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Protocol {
    #[strum(serialize = "tcp")]
    Tcp,
    #[strum(serialize = "ws")]
    Websocket,
}

impl Protocol {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "tcp" => Some(Self::Tcp),
            "ws" => Some(Self::Websocket),
            _ => None,
        }
    }
}

/// Used to create a transport, immutable once parsed
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct ConnectionUri {
    protocol: Protocol,
    host: String,
    port: u16,
}

impl fmt::Display for ConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl FromStr for ConnectionUri {
    type Err = RSocketError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[inline]
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[inline]
fn is_host(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', ':'])
}

/// At least two digits, the first one non-zero
#[inline]
fn is_port(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && matches!(b[0], b'1'..=b'9') && b.iter().all(|c| c.is_ascii_digit())
}

impl ConnectionUri {
    /// Parse a URI string.
    ///
    /// A scheme other than `tcp` / `ws` is [RSocketError::UnsupportedProtocol], anything else that
    /// does not match the shape (including ports above 65535) is [RSocketError::InvalidUri].
    pub fn parse(uri: &str) -> Result<Self, RSocketError> {
        let invalid = || RSocketError::InvalidUri(uri.to_string());
        let (protocol, rest) = match uri.split_once("://") {
            None => (Protocol::Tcp, uri),
            Some((scheme, rest)) => {
                if !is_scheme(scheme) {
                    return Err(invalid());
                }
                match Protocol::from_scheme(scheme) {
                    Some(p) => (p, rest),
                    None => return Err(RSocketError::UnsupportedProtocol(scheme.to_string())),
                }
            }
        };
        let Some((host, port)) = rest.split_once(':') else {
            return Err(invalid());
        };
        if !is_host(host) || !is_port(port) {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { protocol, host: host.to_string(), port })
    }

    #[inline(always)]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[inline(always)]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline(always)]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Creates a new client-side transport with default timeouts.
    #[inline]
    pub fn make_client_transport(&self) -> Result<ClientTransport, RSocketError> {
        self.make_client_transport_with(&SocketConfig::default())
    }

    /// Creates a client-side transport using the timeouts of `config.transport`.
    pub fn make_client_transport_with(
        &self, config: &SocketConfig,
    ) -> Result<ClientTransport, RSocketError> {
        let config = &config.transport;
        match self.protocol {
            Protocol::Tcp => Ok(ClientTransport::Tcp(TcpClientTransport::new(self.addr(), config))),
            Protocol::Websocket => {
                let url = format!("{}://{}:{}/", self.protocol, self.host, self.port);
                Ok(ClientTransport::Websocket(WsClientTransport::new(url, config)?))
            }
        }
    }

    /// Creates a new server-side transport with default timeouts.
    #[inline]
    pub fn make_server_transport(&self) -> Result<ServerTransport, RSocketError> {
        self.make_server_transport_with(&SocketConfig::default())
    }

    /// A WebSocket server accepts upgrades on [DEFAULT_WEBSOCKET_PATH] only, within
    /// `config.transport.handshake_timeout`.
    pub fn make_server_transport_with(
        &self, config: &SocketConfig,
    ) -> Result<ServerTransport, RSocketError> {
        let addr = self.addr();
        let tp = match self.protocol {
            Protocol::Tcp => ServerTransport::Tcp(TcpServerTransport::new(addr)),
            Protocol::Websocket => ServerTransport::Websocket(WsServerTransport::new(
                addr,
                DEFAULT_WEBSOCKET_PATH,
                &config.transport,
            )),
        };
        debug!("{} resolved to {:?}", self, tp);
        Ok(tp)
    }
}

/// An established connection, not framed yet
pub enum Connection {
    Tcp(TcpStream),
    WsClient(WsClientStream),
    WsServer(WsServerStream),
}

impl Connection {
    #[inline]
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Tcp(_) => Protocol::Tcp,
            Self::WsClient(_) | Self::WsServer(_) => Protocol::Websocket,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Tcp(s) => match s.peer_addr() {
                Ok(addr) => write!(f, "tcp conn {}", addr),
                Err(_) => write!(f, "tcp conn"),
            },
            Self::WsClient(_) => write!(f, "ws client conn"),
            Self::WsServer(s) => match s.get_ref().peer_addr() {
                Ok(addr) => write!(f, "ws server conn {}", addr),
                Err(_) => write!(f, "ws server conn"),
            },
        }
    }
}

/// Client transport handle, see [ConnectionUri::make_client_transport]
#[derive(Clone, Debug)]
pub enum ClientTransport {
    Tcp(TcpClientTransport),
    Websocket(WsClientTransport),
}

impl ClientTransport {
    /// `host:port` for TCP, the full URL for WebSocket
    #[inline]
    pub fn target(&self) -> &str {
        match self {
            Self::Tcp(tp) => tp.addr(),
            Self::Websocket(tp) => tp.url(),
        }
    }

    pub async fn connect(&self) -> Result<Connection, RSocketError> {
        match self {
            Self::Tcp(tp) => Ok(Connection::Tcp(tp.connect().await?)),
            Self::Websocket(tp) => Ok(Connection::WsClient(tp.connect().await?)),
        }
    }
}

/// Server transport factory, see [ConnectionUri::make_server_transport]
#[derive(Clone, Debug)]
pub enum ServerTransport {
    Tcp(TcpServerTransport),
    Websocket(WsServerTransport),
}

impl ServerTransport {
    #[inline]
    pub fn addr(&self) -> &str {
        match self {
            Self::Tcp(tp) => tp.addr(),
            Self::Websocket(tp) => tp.addr(),
        }
    }

    /// The upgrade path, None for TCP
    #[inline]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Tcp(_) => None,
            Self::Websocket(tp) => Some(tp.path()),
        }
    }

    pub async fn bind(&self) -> Result<Listener, RSocketError> {
        match self {
            Self::Tcp(tp) => Ok(Listener::Tcp(tp.bind().await?)),
            Self::Websocket(tp) => Ok(Listener::Websocket(tp.bind().await?)),
        }
    }
}

#[derive(Debug)]
pub enum Listener {
    Tcp(TcpServerListener),
    Websocket(WsServerListener),
}

impl Listener {
    pub async fn accept(&self) -> Result<(Connection, SocketAddr), RSocketError> {
        match self {
            Self::Tcp(l) => {
                let (stream, peer) = l.accept().await?;
                Ok((Connection::Tcp(stream), peer))
            }
            Self::Websocket(l) => {
                let (stream, peer) = l.accept().await?;
                Ok((Connection::WsServer(stream), peer))
            }
        }
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr, RSocketError> {
        match self {
            Self::Tcp(l) => l.local_addr(),
            Self::Websocket(l) => l.local_addr(),
        }
    }
}
