use crate::ws_err;
use rsocket_core::{TransportConfig, error::RSocketError, io_with_timeout};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

/// The path a WebSocket server accepts upgrades on
pub const DEFAULT_WEBSOCKET_PATH: &str = "/";

pub type WsServerStream = WebSocketStream<TcpStream>;

/// Server-side WebSocket transport factory, nothing is bound until [WsServerTransport::bind]
#[derive(Clone)]
pub struct WsServerTransport {
    addr: String,
    path: Arc<str>,
    handshake_timeout: Duration,
}

impl fmt::Debug for WsServerTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ws server {}{}", self.addr, self.path)
    }
}

impl WsServerTransport {
    #[inline]
    pub fn new(addr: impl Into<String>, path: &str, config: &TransportConfig) -> Self {
        Self { addr: addr.into(), path: Arc::from(path), handshake_timeout: config.handshake_timeout }
    }

    #[inline(always)]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline(always)]
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    pub async fn bind(&self) -> Result<WsServerListener, RSocketError> {
        match TcpListener::bind(self.addr.as_str()).await {
            Ok(listener) => {
                debug!("{:?} listening", self);
                Ok(WsServerListener {
                    listener,
                    path: self.path.clone(),
                    handshake_timeout: self.handshake_timeout,
                })
            }
            Err(e) => {
                error!("{:?} failed to listen: {}", self, e);
                Err(e.into())
            }
        }
    }
}

pub struct WsServerListener {
    listener: TcpListener,
    path: Arc<str>,
    handshake_timeout: Duration,
}

impl fmt::Debug for WsServerListener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.listener.local_addr() {
            Ok(addr) => write!(f, "ws listener {}{}", addr, self.path),
            Err(_) => write!(f, "ws listener {}", self.path),
        }
    }
}

impl WsServerListener {
    /// Accept one TCP connection and run the upgrade handshake on it.
    ///
    /// A request for another path is answered with 404 and reported as an error, the listener
    /// itself stays usable.
    pub async fn accept(&self) -> Result<(WsServerStream, SocketAddr), RSocketError> {
        let (stream, peer) = self.listener.accept().await?;
        let path = self.path.clone();
        let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            if req.uri().path() == &*path {
                return Ok(resp);
            }
            let mut err = ErrorResponse::new(Some(format!("no endpoint at {}", req.uri().path())));
            *err.status_mut() = StatusCode::NOT_FOUND;
            Err(err)
        };
        match io_with_timeout!(self.handshake_timeout, accept_hdr_async(stream, check_path)) {
            Ok(ws) => {
                trace!("{:?} accepted {}", self, peer);
                Ok((ws, peer))
            }
            Err(e) => {
                warn!("{:?} handshake with {} failed: {}", self, peer, e);
                Err(ws_err(e))
            }
        }
    }

    #[inline]
    pub fn local_addr(&self) -> Result<SocketAddr, RSocketError> {
        Ok(self.listener.local_addr()?)
    }
}
